//! Failure modes specific to running the RPC surface itself (connection
//! setup, address parsing) that don't belong to `corelib`, `streaming`,
//! or `shardstore`'s own error types.

use corelib::ErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum PeerError {
    #[error("invalid peer address {0:?}: {1}")]
    InvalidAddress(String, std::net::AddrParseError),
    #[error(transparent)]
    Streaming(#[from] streaming::StreamingError),
    #[error(transparent)]
    ShardStore(#[from] shardstore::Error),
    #[error(transparent)]
    Core(#[from] corelib::Error),
    #[error("call to {0} timed out")]
    Timeout(String),
    #[error("local socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl PeerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PeerError::InvalidAddress(..) => ErrorKind::InvalidArgument,
            PeerError::Streaming(e) => e.kind(),
            PeerError::ShardStore(e) => e.kind(),
            PeerError::Core(e) => e.kind(),
            PeerError::Timeout(_) => ErrorKind::Timeout,
            PeerError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<PeerError> for corelib::Error {
    fn from(e: PeerError) -> Self {
        corelib::Error::new(e.kind(), e.to_string())
    }
}
