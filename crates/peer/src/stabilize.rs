//! Background task driving the periodic Stabilize procedure (spec §4.3,
//! default interval 1s per spec §5).

use std::time::Duration;

use crate::node::PeerNode;

pub const DEFAULT_STAB_INTERVAL: Duration = Duration::from_secs(1);

/// Runs `RingNode::stabilize` every `interval` until cancelled. Stabilize
/// itself tolerates and retries transient failures on the next tick
/// (spec §4.3), so this loop never needs to back off or give up.
pub async fn run_stabilize(node: &PeerNode, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        node.service.ring().stabilize().await;
        metrics::counter!("peer_stabilize_tick_total").increment(1);
    }
}
