//! Wire protocol and QUIC transport plumbing shared by the peer server
//! and its outbound client: message framing, the request/reply types for
//! every RPC in spec §6's table, and bidirectional-stream setup.

pub mod codec;
pub mod error;
pub mod protocol;
pub mod receiver;
pub mod sender;
pub mod transport;

pub use error::StreamingError;
pub use protocol::{
    DeleteReply, DeleteRequest, DeleteResult, FindPredecessorRequest, FindSuccessorInRingReply,
    FindSuccessorInRingRequest, FindSuccessorInRingResult, FingerReply, MessageType, NotifyRequest,
    PingReply, PingRequest, ReadChunk, ReadReplyHeader, ReadReplyHeaderResult, ReadRequest, Request,
    RpcError, WriteChunk, WriteHeader, WriteReply, WriteResult,
};
pub use receiver::StreamReceiver;
pub use sender::StreamSender;
pub use transport::{client_endpoint, server_endpoint};
