//! Per-resource fetch error.

/// Why a single resource could not be made valid on disk.
///
/// Every variant carries the resource id so a failed batch can name it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a status other than 2xx.
    #[error("resource {id}: server returned HTTP {status}")]
    FetchFailed { id: u32, status: u32 },
    /// Network-level failure (DNS, connect, reset, timeout).
    #[error("resource {id}: transport error: {cause}")]
    TransportError { id: u32, cause: curl::Error },
    /// The server answered 2xx but the body is too small to count as a valid
    /// file (empty or placeholder response). Nothing is written.
    #[error("resource {id}: body of {bytes} bytes is not larger than {min_valid_bytes}")]
    Undersized {
        id: u32,
        bytes: u64,
        min_valid_bytes: u64,
    },
    /// The body could not be persisted (create, write, sync or rename).
    #[error("resource {id}: write failed: {cause}")]
    WriteFailed { id: u32, cause: std::io::Error },
    /// The run was cancelled while this resource was in flight.
    #[error("resource {id}: aborted")]
    Aborted { id: u32 },
}

impl FetchError {
    pub fn id(&self) -> u32 {
        match self {
            FetchError::FetchFailed { id, .. }
            | FetchError::TransportError { id, .. }
            | FetchError::Undersized { id, .. }
            | FetchError::WriteFailed { id, .. }
            | FetchError::Aborted { id } => *id,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::Aborted { .. })
    }
}
