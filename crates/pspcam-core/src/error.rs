use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found, tried: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process {pid}: {source}")]
    ProcessOpenFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Process handle is closed")]
    HandleClosed,

    #[error("No guest RAM region found")]
    RegionNotFound,

    #[error("Guest memory base not established")]
    BaseNotEstablished,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check whether this error means the target process is gone or its
    /// memory is no longer reachable (as opposed to a startup failure).
    pub fn is_memory_io(&self) -> bool {
        matches!(
            self,
            Error::MemoryReadFailed { .. } | Error::MemoryWriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_memory_io() {
        let err = Error::MemoryReadFailed {
            address: 0x1000,
            message: "unmapped".to_string(),
        };
        assert!(err.is_memory_io());
        assert!(!Error::BaseNotEstablished.is_memory_io());
    }
}
