//! The outbound RPC surface `RingNode` needs, kept as a trait so the
//! Chord algorithm has no dependency on any particular network stack or
//! async runtime. `peer`'s QUIC client is the real implementation; tests
//! in this crate use an in-process fake.

use crate::finger::Finger;
use crate::identifier::Identifier;

/// Why an outbound ring RPC failed. Both variants degrade the same way
/// in the lookup algorithms (the finger is treated as dead for this
/// call); the distinction exists so callers/metrics can tell a hung peer
/// from a clearly-gone one.
#[derive(thiserror::Error, Debug, Clone)]
pub enum TransportError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Outbound calls a `RingNode` makes against other nodes in the ring.
///
/// Every method corresponds to one row of spec's wire-message table:
/// `get_successor`/`get_predecessor`/`find_predecessor`/`notify` are the
/// primitive ring RPCs; `find_successor` is `FindSuccessorInRing`, used
/// only during `Join` to ask the bootstrap node to run its own full
/// lookup (a brand-new node has no finger table of its own yet to do
/// this locally).
#[async_trait::async_trait]
pub trait RingTransport: Send + Sync {
    async fn get_successor(&self, address: &str) -> Result<Finger, TransportError>;
    async fn get_predecessor(&self, address: &str) -> Result<Finger, TransportError>;
    async fn find_predecessor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError>;
    async fn notify(&self, address: &str, candidate: Finger) -> Result<(), TransportError>;
    async fn find_successor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError>;
}
