//! Session configuration, fixed at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::layout::timing;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mouse-look sensitivity
    pub sensitivity: f32,
    pub invert_pitch: bool,
    /// Candidate process names, tried in order
    pub process_names: Vec<String>,
    /// Injection tick interval
    pub poll_interval_ms: u64,
    /// Delay after a failed tick before polling resumes
    pub error_backoff_ms: u64,
    /// Pointer input device
    pub mouse_device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: 50.0,
            invert_pitch: false,
            process_names: vec![
                "PPSSPPSDL".to_string(),
                "PPSSPPQt".to_string(),
                "ppsspp".to_string(),
            ],
            poll_interval_ms: timing::POLL_INTERVAL_MS,
            error_backoff_ms: timing::ERROR_BACKOFF_MS,
            mouse_device: "/dev/input/mice".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
