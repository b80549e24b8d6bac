//! `PeerService`: the RPC surface that combines `corelib::RingNode`
//! lookups with `shardstore::ShardStore` I/O and authenticates every
//! `Write`/`Read`/`Delete` against a capability (spec §4.5).
//!
//! This crate is the "external collaborator" layer spec §1 leaves
//! unspecified beyond its interface: QUIC framing (`streaming`), the
//! accept loop, and the outbound clients `corelib::RingNode` and
//! `erasure::ErasureClient` need to reach other peers over the network.

pub mod error;
pub mod node;
pub mod ring_transport;
pub mod server;
pub mod service;
pub mod shard_transport;
pub mod stabilize;

pub use error::PeerError;
pub use node::PeerNode;
pub use ring_transport::QuicRingTransport;
pub use server::serve;
pub use service::PeerService;
pub use shard_transport::QuicShardTransport;
pub use stabilize::{run_stabilize, DEFAULT_STAB_INTERVAL};
