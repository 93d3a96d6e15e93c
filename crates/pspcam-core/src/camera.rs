//! Camera injection engine for Medal of Honor Heroes.
//!
//! Each tick re-reads the camera fields from guest memory before
//! composing the update, so changes made by the game itself (level
//! transitions, scripted cameras) are respected rather than clobbered
//! by stale host-side state.

use tracing::trace;

use crate::error::Result;
use crate::memory::layout::mohh;
use crate::memory::{GuestMemory, RawMemory};

pub use crate::memory::layout::mohh::{FULL_TURN, PITCH_LIMIT};

/// Tunable injection parameters, fixed at session start.
#[derive(Debug, Clone, Copy)]
pub struct CameraParams {
    pub sensitivity: f32,
    pub invert_pitch: bool,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            sensitivity: 50.0,
            invert_pitch: false,
        }
    }
}

/// What a single injection tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InjectOutcome {
    /// New angles were written back
    Applied { yaw: f32, pitch: f32 },
    /// Camera base pointer is null (not in a level yet)
    CameraUnavailable,
    /// No movement this tick, nothing written
    Idle,
}

pub struct CameraInjector {
    params: CameraParams,
}

impl CameraInjector {
    pub fn new(params: CameraParams) -> Self {
        Self { params }
    }

    /// Run one injection tick with the drained movement deltas.
    ///
    /// A read or write failure aborts this tick only; the engine carries
    /// no state and is simply invoked again on the next tick.
    pub fn inject<M: RawMemory>(
        &self,
        guest: &GuestMemory<'_, M>,
        dx: f32,
        dy: f32,
    ) -> Result<InjectOutcome> {
        let cam = guest.read_pointer(mohh::CAMERA_BASE_PTR)?;
        if cam == 0 {
            return Ok(InjectOutcome::CameraUnavailable);
        }

        let fov = guest.read_f32(cam + mohh::FOV)?;

        if dx == 0.0 && dy == 0.0 {
            return Ok(InjectOutcome::Idle);
        }

        let yaw = guest.read_f32(cam + mohh::CAM_YAW)?;
        let pitch = guest.read_f32(cam + mohh::CAM_PITCH)?;

        let (yaw, pitch) = compute_look(
            yaw,
            pitch,
            dx,
            dy,
            fov,
            self.params.sensitivity,
            self.params.invert_pitch,
        );

        guest.write_f32(cam + mohh::CAM_YAW, yaw)?;
        guest.write_f32(cam + mohh::CAM_PITCH, pitch)?;

        trace!("Injected yaw {yaw} pitch {pitch} (fov {fov})");
        Ok(InjectOutcome::Applied { yaw, pitch })
    }
}

/// Pure update step: current angles + deltas -> wrapped/clamped angles.
pub fn compute_look(
    yaw: f32,
    pitch: f32,
    dx: f32,
    dy: f32,
    fov: f32,
    sensitivity: f32,
    invert_pitch: bool,
) -> (f32, f32) {
    let look = sensitivity / 20.0;
    let scale = 20000.0;

    let yaw = yaw - dx * look / scale * fov;
    let step = dy * look / scale * fov;
    let pitch = if invert_pitch { pitch + step } else { pitch - step };

    (wrap_yaw(yaw), clamp_pitch(pitch))
}

/// Normalize yaw into `(-π, π]` by whole turns.
///
/// Single-tick deltas land within one turn of the range, so the
/// iterative correction matches the game's own wrap exactly. Values many
/// turns out (pathological deltas) are remapped by modulo first so the
/// loop stays bounded.
pub fn wrap_yaw(mut yaw: f32) -> f32 {
    const HALF_TURN: f32 = FULL_TURN / 2.0;

    if !yaw.is_finite() {
        return 0.0;
    }
    if yaw.abs() > FULL_TURN * 4.0 {
        yaw = (yaw + HALF_TURN).rem_euclid(FULL_TURN) - HALF_TURN;
    }

    while yaw > HALF_TURN {
        yaw -= FULL_TURN;
    }
    while yaw < -HALF_TURN {
        yaw += FULL_TURN;
    }
    yaw
}

/// Clamp pitch to `[-PITCH_LIMIT, PITCH_LIMIT]`.
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}
