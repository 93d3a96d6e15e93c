//! # pspcam-core
//!
//! Core library for the pspcam mouse-look injector.
//!
//! This crate provides:
//! - Process discovery and attachment over `/proc/<pid>/{mem,maps}`
//! - Heuristic discovery of the emulated PSP RAM region
//! - Typed, guest-relative memory access with pointer rebasing
//! - The Medal of Honor Heroes camera injection engine
//! - Pointer-delta accumulation and the input collaborator contract
//!
//! ## Feature Flags
//!
//! - `debug-tools`: raw memory dumps and JSON scan reports for
//!   diagnosing scanner misses. Not used on the injection path.

pub mod camera;
pub mod config;
#[cfg(feature = "debug-tools")]
pub mod diag;
pub mod error;
pub mod input;
pub mod memory;

pub use camera::{
    CameraInjector, CameraParams, FULL_TURN, InjectOutcome, PITCH_LIMIT, clamp_pitch,
    compute_look, wrap_yaw,
};
pub use config::Config;
pub use error::{Error, Result};
pub use input::{DeltaAccumulator, MiceSource, PointerSource, PointerTracker};
pub use memory::{
    DiscoveredProcess, GuestMemory, MemoryRegion, ProcessHandle, ProcessProvider,
    ProcfsProvider, RawMemory, layout, parse_maps, scanner,
};

#[cfg(feature = "debug-tools")]
pub use diag::{RegionReport, ScanReport, dump_region};
