//! Failure modes for local shard storage.

use corelib::ErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid shard name: {0}")]
    InvalidArgument(String),
    #[error("io error: {0}")]
    Io(#[source] std::io::Error),
    #[error("blocking task panicked: {0}")]
    TaskPanicked(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn from_io(e: std::io::Error) -> Self {
        Error::Io(e)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Io(_) | Error::TaskPanicked(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for corelib::Error {
    fn from(e: Error) -> Self {
        corelib::Error::new(e.kind(), e.to_string())
    }
}
