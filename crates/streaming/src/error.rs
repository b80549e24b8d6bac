//! Failure modes for framing and transport, folded into the shared
//! `ErrorKind` taxonomy at the crate boundary.

use corelib::ErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum StreamingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("message of {0} bytes exceeds the {1}-byte frame limit")]
    MessageTooLarge(u32, u32),
    #[error("quic connection error: {0}")]
    Connection(#[from] quinn::ConnectionError),
    #[error("quic write error: {0}")]
    Write(#[from] quinn::WriteError),
    #[error("quic read error: {0}")]
    Read(#[from] quinn::ReadError),
    #[error("endpoint configuration error: {0}")]
    Config(String),
    #[error("peer closed the stream before a complete message arrived")]
    UnexpectedEof,
}

impl StreamingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamingError::Io(_)
            | StreamingError::Connection(_)
            | StreamingError::Write(_)
            | StreamingError::Read(_) => ErrorKind::NetworkUnreachable,
            StreamingError::Codec(_)
            | StreamingError::MessageTooLarge(..)
            | StreamingError::UnexpectedEof => ErrorKind::Internal,
            StreamingError::Config(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl From<StreamingError> for corelib::Error {
    fn from(e: StreamingError) -> Self {
        corelib::Error::new(e.kind(), e.to_string())
    }
}
