//! Error taxonomy shared across the workspace.
//!
//! Every crate that can fail defines its own `Error` for its own
//! concerns, but all of them carry (and can be converted into) one
//! `ErrorKind`, so a caller at the edge of the system can always match on
//! a stable, small set of outcomes regardless of which crate produced
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// The authoritative outcome of a failed operation.
///
/// A `Display`-formatted `Error` may add context, but code should match
/// on `kind()`, never on message text. `Serialize`/`Deserialize` let this
/// travel as-is in an RPC reply (`streaming::protocol::RpcError`) instead
/// of being collapsed to a string and re-parsed at the other end.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ErrorKind {
    NetworkUnreachable,
    Timeout,
    PermissionDenied,
    SizeViolation,
    NotFound,
    BufferTooSmall,
    TooManyCorrupt,
    LookupFailed,
    InvalidArgument,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NetworkUnreachable => "network unreachable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::SizeViolation => "size violation",
            ErrorKind::NotFound => "not found",
            ErrorKind::BufferTooSmall => "buffer too small",
            ErrorKind::TooManyCorrupt => "too many corrupt shards",
            ErrorKind::LookupFailed => "lookup failed",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// Error type for the core library (identifier, capability, ring).
#[derive(thiserror::Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn lookup_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LookupFailed, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn network_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkUnreachable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}
