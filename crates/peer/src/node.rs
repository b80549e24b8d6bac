//! Wires a `RingNode`, `ShardStore`, and `PeerService` into one running
//! node: binds the QUIC server endpoint, builds the outbound ring
//! transport, and either starts a ring of one or joins through a
//! bootstrap address (spec §4.3 `new`/`Join`, §6 "launch surface").

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use corelib::RingNode;
use quinn::Endpoint;
use shardstore::ShardStore;

use crate::error::PeerError;
use crate::ring_transport::QuicRingTransport;
use crate::service::PeerService;

/// Default per-call deadline for outbound ring RPCs (spec §5: "every
/// outbound RPC carries a deadline").
pub const DEFAULT_RPC_DEADLINE: Duration = Duration::from_secs(5);

/// One node's running state: the server-side `PeerService` plus the QUIC
/// endpoint its accept loop listens on.
pub struct PeerNode {
    pub service: PeerService,
    pub server_endpoint: Endpoint,
    pub addr: SocketAddr,
}

impl PeerNode {
    /// Binds `bind_addr`, builds the outbound QUIC ring transport, and
    /// either starts a ring of one (`bootstrap = None`) or joins the
    /// ring through `bootstrap`.
    pub async fn new(
        bind_addr: SocketAddr,
        ring_modulus: u64,
        bootstrap: Option<&str>,
        store_root: impl Into<PathBuf>,
        capability_key: Vec<u8>,
    ) -> Result<Self, PeerError> {
        Self::with_deadline(
            bind_addr,
            ring_modulus,
            bootstrap,
            store_root,
            capability_key,
            DEFAULT_RPC_DEADLINE,
        )
        .await
    }

    pub async fn with_deadline(
        bind_addr: SocketAddr,
        ring_modulus: u64,
        bootstrap: Option<&str>,
        store_root: impl Into<PathBuf>,
        capability_key: Vec<u8>,
        rpc_deadline: Duration,
    ) -> Result<Self, PeerError> {
        let server_endpoint = streaming::server_endpoint(bind_addr)?;
        // `bind_addr` may carry an ephemeral port (`:0`); the address we
        // hash and advertise to the rest of the ring must be the one the
        // OS actually bound, not the one we asked for.
        let bound_addr = server_endpoint.local_addr()?;
        let client_endpoint = streaming::client_endpoint()?;

        let ring_transport = QuicRingTransport::new(client_endpoint, rpc_deadline, ring_modulus);
        let self_addr = bound_addr.to_string();
        let ring = RingNode::new(self_addr, ring_modulus, bootstrap, ring_transport).await?;

        let store = ShardStore::new(store_root)?;
        let service = PeerService::new(ring, store, Arc::new(capability_key));

        Ok(Self {
            service,
            server_endpoint,
            addr: bound_addr,
        })
    }
}
