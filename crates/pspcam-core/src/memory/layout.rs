//! Memory layout constants for the guest and the MOHH camera structures
//!
//! All game offsets are guest-relative (offsets from the discovered guest
//! RAM base), not host virtual addresses.

/// Guest RAM discovery constants for the PSP platform
pub mod guest {
    /// Expected size of the emulated PSP user RAM mapping
    pub const TARGET_RAM_SIZE: u64 = 32 * 1024 * 1024;

    /// Regions smaller than this are never considered
    pub const MIN_REGION_SIZE: u64 = 1024 * 1024;

    /// Relative tolerance around [`TARGET_RAM_SIZE`] (10%)
    pub const SIZE_TOLERANCE: f64 = 0.1;

    /// Subtracted from a raw guest pointer value to turn the PSP
    /// virtual address into a guest-relative offset
    pub const POINTER_REBASE: u32 = 0x0800_0000;

    /// Disc ID of Medal of Honor Heroes (US), present in guest RAM once
    /// the game is loaded
    pub const MOHH_DISC_ID: &[u8] = b"ULUS-1014";

    /// How far into guest RAM the disc ID scan looks
    pub const DISC_ID_SCAN_LIMIT: u64 = TARGET_RAM_SIZE;
}

/// Camera structure offsets for Medal of Honor Heroes
pub mod mohh {
    /// Guest-relative location of the camera base pointer
    pub const CAMERA_BASE_PTR: u64 = 0xD8_361C;

    /// Pitch angle (radians), relative to the camera base
    pub const CAM_PITCH: u64 = 0x188;

    /// Yaw angle (radians), relative to the camera base
    pub const CAM_YAW: u64 = 0x1A4;

    /// Field of view (degrees), relative to the camera base
    pub const FOV: u64 = 0x1E8;

    /// Full turn in radians, rounded the way the game stores it (0x40C90FDB)
    pub const FULL_TURN: f32 = 6.2831853;

    /// Pitch clamp bound (~85°), keeping the camera off the vertical poles
    pub const PITCH_LIMIT: f32 = 1.483529806;
}

/// Timing constants for the polling loop
pub mod timing {
    /// Interval between injection ticks (ms), 100 Hz
    pub const POLL_INTERVAL_MS: u64 = 10;

    /// Delay after a failed tick before polling resumes (ms)
    pub const ERROR_BACKOFF_MS: u64 = 1000;
}
