//! Wire types for every RPC in spec's message table (spec.md §6). Every
//! call opens one QUIC bidirectional stream; the first message a caller
//! sends is a `Request` that both names the RPC and carries its
//! request-scoped fields. `Write`/`Read` continue with one or more
//! follow-on messages on the same stream once the RPC kind is
//! established.

use corelib::{Capability, ErrorKind, Identifier};
use serde::{Deserialize, Serialize};

/// Labels an RPC for logging/metrics without re-deriving it from the
/// `Request` variant at every call site.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MessageType {
    GetSuccessor,
    GetPredecessor,
    FindPredecessor,
    Notify,
    FindSuccessorInRing,
    Write,
    Read,
    Delete,
    Ping,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::GetSuccessor => "get_successor",
            MessageType::GetPredecessor => "get_predecessor",
            MessageType::FindPredecessor => "find_predecessor",
            MessageType::Notify => "notify",
            MessageType::FindSuccessorInRing => "find_successor_in_ring",
            MessageType::Write => "write",
            MessageType::Read => "read",
            MessageType::Delete => "delete",
            MessageType::Ping => "ping",
        }
    }
}

/// The opening message of every RPC stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Request {
    GetSuccessor,
    GetPredecessor,
    FindPredecessor(FindPredecessorRequest),
    Notify(NotifyRequest),
    FindSuccessorInRing(FindSuccessorInRingRequest),
    Write(WriteHeader),
    Read(ReadRequest),
    Delete(DeleteRequest),
    Ping(PingRequest),
}

impl Request {
    pub fn message_type(&self) -> MessageType {
        match self {
            Request::GetSuccessor => MessageType::GetSuccessor,
            Request::GetPredecessor => MessageType::GetPredecessor,
            Request::FindPredecessor(_) => MessageType::FindPredecessor,
            Request::Notify(_) => MessageType::Notify,
            Request::FindSuccessorInRing(_) => MessageType::FindSuccessorInRing,
            Request::Write(_) => MessageType::Write,
            Request::Read(_) => MessageType::Read,
            Request::Delete(_) => MessageType::Delete,
            Request::Ping(_) => MessageType::Ping,
        }
    }
}

/// `{addr, id}`, the reply shape shared by `GetSuccessor`,
/// `GetPredecessor`, and `FindPredecessor`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FingerReply {
    pub address: String,
    pub id: Identifier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindPredecessorRequest {
    pub id: Identifier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub address: String,
    pub id: Identifier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindSuccessorInRingRequest {
    pub id: Identifier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindSuccessorInRingReply {
    pub address: String,
}

/// First message of a `Write` stream: names the shard and presents the
/// capability authorizing the write. Chunks follow as plain `WriteChunk`
/// messages until the client half-closes its send side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriteHeader {
    pub name: String,
    pub capability: Capability,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriteChunk {
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriteReply {
    pub written: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadRequest {
    pub name: String,
    pub chunk_size: u32,
    pub capability: Capability,
}

/// First reply on a `Read` stream: whether the shard exists at all. No
/// `ReadChunk` follows when `exists` is false.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadReplyHeader {
    pub exists: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadChunk {
    pub data: Vec<u8>,
    pub size: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub name: String,
    pub capability: Capability,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteReply;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingRequest {
    pub ok: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingReply {
    pub ok: bool,
}

/// Carries a failed fallible RPC's outcome over the wire. `GetSuccessor`,
/// `GetPredecessor`, `FindPredecessor`, `Notify`, and `Ping` are handled
/// locally by `RingNode` and can't fail, so their replies travel bare;
/// `FindSuccessorInRing`, `Write`, `Read`, and `Delete` can fail for
/// reasons the caller must distinguish (a dead ring, a bad capability, a
/// short write), so their replies are `Result<_, RpcError>`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<corelib::Error> for RpcError {
    fn from(e: corelib::Error) -> Self {
        RpcError {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<RpcError> for corelib::Error {
    fn from(e: RpcError) -> Self {
        corelib::Error::new(e.kind, e.message)
    }
}

pub type FindSuccessorInRingResult = Result<FindSuccessorInRingReply, RpcError>;
pub type WriteResult = Result<WriteReply, RpcError>;
pub type ReadReplyHeaderResult = Result<ReadReplyHeader, RpcError>;
pub type DeleteResult = Result<DeleteReply, RpcError>;
