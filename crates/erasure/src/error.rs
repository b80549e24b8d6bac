//! Failure modes for shard transport and erasure coding.

use corelib::ErrorKind;

/// Why a per-shard RPC failed, as seen from the client side. Mirrors
/// `corelib::ring::TransportError` in shape but carries the extra
/// outcomes a `Write`/`Read`/`Delete` call can report that a bare ring
/// lookup can't.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ShardTransportError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("size violation: {0}")]
    SizeViolation(String),
}

impl ShardTransportError {
    fn kind(&self) -> ErrorKind {
        match self {
            ShardTransportError::Unreachable(_) => ErrorKind::NetworkUnreachable,
            ShardTransportError::Timeout(_) => ErrorKind::Timeout,
            ShardTransportError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ShardTransportError::SizeViolation(_) => ErrorKind::SizeViolation,
        }
    }

    /// Transient failures the backoff-and-retry loop should retry;
    /// anything else (permission, size) is terminal per spec §7
    /// ("Capability failures are never retried").
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ShardTransportError::Unreachable(_) | ShardTransportError::Timeout(_)
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("too many corrupt shards: {missing} missing, at most {max} tolerable")]
    TooManyCorrupt { missing: usize, max: usize },
    #[error("buffer too small: need at least {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },
    #[error("reed-solomon codec error: {0}")]
    Codec(String),
    #[error("lookup failed: {0}")]
    LookupFailed(String),
    #[error(transparent)]
    Transport(#[from] ShardTransportError),
    /// `DeleteFileRSC` aggregates a failure per shard (spec §4.6:
    /// "aggregate errors; success requires all deletes to succeed or
    /// report NotFound") rather than surfacing only the first one.
    #[error("{} of {total} shard deletes failed: {}", failures.len(), failures.iter().map(|(n, e)| format!("{n}: {e}")).collect::<Vec<_>>().join("; "))]
    DeleteFailed {
        failures: Vec<(String, Error)>,
        total: usize,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooManyCorrupt { .. } => ErrorKind::TooManyCorrupt,
            Error::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Error::Codec(_) => ErrorKind::Internal,
            Error::LookupFailed(_) => ErrorKind::LookupFailed,
            Error::Transport(e) => e.kind(),
            Error::DeleteFailed { failures, .. } => failures
                .first()
                .map(|(_, e)| e.kind())
                .unwrap_or(ErrorKind::Internal),
        }
    }

    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_transient())
    }
}

impl From<Error> for corelib::Error {
    fn from(e: Error) -> Self {
        corelib::Error::new(e.kind(), e.to_string())
    }
}
