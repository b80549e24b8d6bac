//! Chord ring convergence tests against an in-process fake transport.
//!
//! These exercise the algorithms in `corelib::ring` with no sockets: a
//! `FakeTransport` looks peers up in a shared registry and calls their
//! `handle_*` methods directly. End-to-end tests over real QUIC sockets
//! live in the `peer` crate.

use std::collections::HashMap;
use std::sync::Arc;

use corelib::identifier::{in_arc, Identifier};
use corelib::ring::{RingNode, RingTransport, TransportError};
use corelib::Finger;
use parking_lot::RwLock;

const M: u64 = 1000;

#[derive(Clone, Default)]
struct FakeTransport {
    registry: Arc<RwLock<HashMap<String, Arc<RingNode<FakeTransport>>>>>,
}

impl FakeTransport {
    fn new() -> Self {
        Self::default()
    }

    fn register(&self, node: Arc<RingNode<FakeTransport>>) {
        self.registry
            .write()
            .insert(node.self_finger().address.clone(), node);
    }

    fn node(&self, address: &str) -> Result<Arc<RingNode<FakeTransport>>, TransportError> {
        self.registry
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::Unreachable(address.to_string()))
    }
}

#[async_trait::async_trait]
impl RingTransport for FakeTransport {
    async fn get_successor(&self, address: &str) -> Result<Finger, TransportError> {
        Ok(self.node(address)?.handle_get_successor())
    }

    async fn get_predecessor(&self, address: &str) -> Result<Finger, TransportError> {
        Ok(self.node(address)?.handle_get_predecessor())
    }

    async fn find_predecessor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError> {
        Ok(self.node(address)?.handle_find_predecessor(id).await)
    }

    async fn notify(&self, address: &str, candidate: Finger) -> Result<(), TransportError> {
        self.node(address)?.handle_notify(candidate);
        Ok(())
    }

    async fn find_successor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError> {
        self.node(address)?
            .find_successor(id)
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))
    }
}

async fn build_ring(transport: &FakeTransport, n: usize) -> Vec<Arc<RingNode<FakeTransport>>> {
    let mut nodes = Vec::with_capacity(n);

    let first_addr = "node-0".to_string();
    let first = RingNode::new(first_addr.clone(), M, None, transport.clone())
        .await
        .unwrap();
    transport.register(first.clone());
    nodes.push(first);

    for i in 1..n {
        let addr = format!("node-{i}");
        let node = RingNode::new(addr, M, Some(&first_addr), transport.clone())
            .await
            .unwrap();
        transport.register(node.clone());
        nodes.push(node);
    }

    nodes
}

async fn converge(nodes: &[Arc<RingNode<FakeTransport>>], ticks: usize) {
    for _ in 0..ticks {
        for node in nodes {
            node.stabilize().await;
        }
    }
}

#[tokio::test]
async fn single_node_ring_points_to_self() {
    let transport = FakeTransport::new();
    let nodes = build_ring(&transport, 1).await;
    let n = &nodes[0];
    assert_eq!(n.successor().id, n.self_finger().id);
    assert_eq!(n.predecessor().id, n.self_finger().id);
}

#[tokio::test]
async fn ring_closure_after_stabilize() {
    let transport = FakeTransport::new();
    let nodes = build_ring(&transport, 8).await;
    converge(&nodes, 20).await;

    for node in &nodes {
        let succ = node.successor();
        let succ_node = nodes
            .iter()
            .find(|n| n.self_finger().id == succ.id)
            .expect("successor must be a live node");
        let succ_pred = succ_node.predecessor();
        assert_eq!(
            succ_pred.id,
            node.self_finger().id,
            "successor(predecessor(n)) should equal n once stabilized"
        );
    }
}

#[tokio::test]
async fn lookup_consistency_after_convergence() {
    let transport = FakeTransport::new();
    let nodes = build_ring(&transport, 11).await;
    converge(&nodes, 40).await;

    let mut ids: Vec<Identifier> = nodes.iter().map(|n| n.self_finger().id).collect();
    ids.sort();

    for probe in [3u64, 17, 250, 499, 500, 999, 0] {
        let probe_id = Identifier(probe % M);
        let expected = *ids
            .iter()
            .find(|id| in_arc(Identifier((probe_id.0 + M - 1) % M), **id, probe_id, true, true, M))
            .unwrap_or(&ids[0]);

        for node in &nodes {
            let found = node.find_successor(probe_id).await.unwrap();
            assert_eq!(
                found.id, expected,
                "node {} disagrees on successor({probe_id}) (lookup consistency)",
                node.self_finger().address
            );
        }
    }
}

#[tokio::test]
async fn lookup_survives_one_dead_non_bootstrap_node() {
    let transport = FakeTransport::new();
    let nodes = build_ring(&transport, 10).await;
    converge(&nodes, 30).await;

    // Kill a non-bootstrap node by removing it from the registry so
    // every RPC to its address fails with Unreachable.
    let victim = nodes[5].self_finger().address.clone();
    transport.registry.write().remove(&victim);

    let survivors: Vec<_> = nodes
        .iter()
        .filter(|n| n.self_finger().address != victim)
        .cloned()
        .collect();

    converge(&survivors, 5).await;

    for node in &survivors {
        let result = node.find_successor(Identifier(1)).await;
        assert!(result.is_ok(), "lookup must not fail outright after one node dies");
    }
}
