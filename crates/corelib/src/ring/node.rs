//! Chord ring membership: finger table, successor/predecessor discovery,
//! join, and stabilization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Error;
use crate::finger::Finger;
use crate::hash::hash;
use crate::identifier::{finger_table_len, in_arc, Identifier};
use crate::ring::transport::{RingTransport, TransportError};

struct NodeState {
    predecessor: Finger,
    finger_table: Vec<Finger>,
}

/// One node's view of the Chord ring: its own identity, predecessor
/// pointer, and finger table, plus the transport used to reach the rest
/// of the ring.
///
/// `fingerTable` and `predecessor` are the only mutable state (behind a
/// single `parking_lot::RwLock`, per the single-writer/multi-reader
/// direction): readers (lookups) take a read lease, `Stabilize` and
/// `Notify` are the only writers.
pub struct RingNode<T: RingTransport> {
    self_finger: Finger,
    m: u64,
    state: RwLock<NodeState>,
    transport: T,
    refresh_cursor: AtomicUsize,
}

impl<T: RingTransport> RingNode<T> {
    /// Constructs a node with `self.id = hash(self_addr, m)`. With no
    /// `bootstrap` the node is a ring of one (predecessor = self, every
    /// finger = self). With a bootstrap it runs Join before returning.
    pub async fn new(
        self_addr: impl Into<String>,
        m: u64,
        bootstrap: Option<&str>,
        transport: T,
    ) -> Result<Arc<Self>, Error> {
        let self_addr = self_addr.into();
        let self_id = hash(self_addr.as_bytes(), m);
        let self_finger = Finger::new(self_id, self_addr);
        let k = finger_table_len(m);

        let node = Arc::new(RingNode {
            self_finger: self_finger.clone(),
            m,
            transport,
            state: RwLock::new(NodeState {
                predecessor: self_finger.clone(),
                finger_table: vec![self_finger; k],
            }),
            refresh_cursor: AtomicUsize::new(0),
        });

        if let Some(bootstrap_addr) = bootstrap {
            node.join(bootstrap_addr).await?;
        }

        Ok(node)
    }

    pub fn self_finger(&self) -> &Finger {
        &self.self_finger
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn table_len(&self) -> usize {
        self.state.read().finger_table.len()
    }

    pub fn successor(&self) -> Finger {
        self.state.read().finger_table[0].clone()
    }

    pub fn predecessor(&self) -> Finger {
        self.state.read().predecessor.clone()
    }

    pub fn finger_table_snapshot(&self) -> Vec<Finger> {
        self.state.read().finger_table.clone()
    }

    /// `find_successor(id) -> address`: the node responsible for `id`.
    pub async fn find_successor(&self, id: Identifier) -> Result<Finger, Error> {
        let pred = self.find_predecessor(id).await?;
        self.successor_of(&pred).await
    }

    /// Iterative equivalent of the source's recursive predecessor walk
    /// (Design Note: "recursive lookup as iteration" avoids unbounded
    /// stack growth on long rings).
    async fn find_predecessor(&self, id: Identifier) -> Result<Finger, Error> {
        let mut cur = self.self_finger.clone();
        let max_hops = self.table_len().saturating_mul(4).max(8);

        for _ in 0..max_hops {
            let cur_succ = self.successor_of(&cur).await?;
            if in_arc(cur.id, cur_succ.id, id, false, true, self.m) {
                return Ok(cur);
            }
            let next = self.closest_preceding_finger_of(&cur, id).await;
            if next.id == cur.id {
                // No finger anywhere in the chain knows of anything
                // better; this is as close as the ring can get us.
                return Ok(cur);
            }
            cur = next;
        }

        Err(Error::lookup_failed(format!(
            "find_predecessor({id}) did not converge within {max_hops} hops"
        )))
    }

    /// `cur`'s successor: the local finger table if `cur` is this node,
    /// else a remote `GetSuccessor`.
    async fn successor_of(&self, cur: &Finger) -> Result<Finger, Error> {
        if cur.id == self.self_finger.id {
            Ok(self.successor())
        } else {
            self.transport
                .get_successor(&cur.address)
                .await
                .map_err(|e| transport_err(&cur.address, e))
        }
    }

    /// `cur`'s `closest_preceding_finger` answer for `id`: computed
    /// locally if `cur` is this node, else the `FindPredecessor` RPC
    /// (which the remote node implements as its own
    /// `closest_preceding_finger`, not a second recursive lookup).
    ///
    /// If `cur` itself is unreachable, degrades to this node's own view
    /// so the overall lookup can still make progress via whichever
    /// finger comes next — failure here is not fatal to the caller, only
    /// to this one hop.
    async fn closest_preceding_finger_of(&self, cur: &Finger, id: Identifier) -> Finger {
        if cur.id == self.self_finger.id {
            self.closest_preceding_finger(id).await
        } else {
            match self.transport.find_predecessor(&cur.address, id).await {
                Ok(f) => f,
                Err(_) => {
                    tracing::warn!(address = %cur.address, "hop unreachable during lookup, degrading");
                    self.closest_preceding_finger(id).await
                }
            }
        }
    }

    /// The largest finger whose id lies in the open arc `(self.id, id)`
    /// that answers a liveness probe; degrades to the next-smaller
    /// finger on probe failure, and to `self` if none qualify.
    pub(crate) async fn closest_preceding_finger(&self, id: Identifier) -> Finger {
        let (self_id, table, m) = {
            let st = self.state.read();
            (self.self_finger.id, st.finger_table.clone(), self.m)
        };

        for finger in table.iter().rev() {
            if finger.id == self_id {
                continue;
            }
            if in_arc(self_id, id, finger.id, false, false, m) {
                match self.transport.get_predecessor(&finger.address).await {
                    Ok(_) => return finger.clone(),
                    Err(_) => {
                        tracing::warn!(address = %finger.address, "finger unreachable, skipping");
                    }
                }
            }
        }
        self.self_finger.clone()
    }

    async fn join(&self, bootstrap_addr: &str) -> Result<(), Error> {
        let succ = self
            .transport
            .find_successor(bootstrap_addr, self.self_finger.id)
            .await
            .map_err(|e| transport_err(bootstrap_addr, e))?;

        {
            let mut st = self.state.write();
            st.finger_table[0] = succ.clone();
        }

        let k = self.table_len();
        for i in 1..k {
            let start = self.self_finger.id.add_pow2(i as u32, self.m);
            let prev = self.state.read().finger_table[i - 1].clone();

            let entry = if in_arc(self.self_finger.id, prev.id, start, false, true, self.m) {
                prev
            } else {
                self.transport
                    .find_successor(bootstrap_addr, start)
                    .await
                    .map_err(|e| transport_err(bootstrap_addr, e))?
            };

            self.state.write().finger_table[i] = entry;
        }

        // Best-effort: if this fails, Stabilize on either side will
        // converge on the next tick.
        let _ = self.transport.notify(&succ.address, self.self_finger.clone()).await;

        Ok(())
    }

    /// One tick of the periodic stabilization procedure: repair
    /// `fingerTable[0]` from the successor's predecessor, notify the
    /// successor of this node, and refresh one more finger (round
    /// robin).
    pub async fn stabilize(&self) {
        let succ = self.successor();
        if succ.id != self.self_finger.id {
            if let Ok(x) = self.transport.get_predecessor(&succ.address).await {
                if in_arc(self.self_finger.id, succ.id, x.id, false, false, self.m) {
                    self.state.write().finger_table[0] = x;
                }
            } else {
                tracing::warn!(address = %succ.address, "successor unreachable during stabilize");
            }
        }

        let succ_now = self.successor();
        if succ_now.id != self.self_finger.id {
            if let Err(e) = self.transport.notify(&succ_now.address, self.self_finger.clone()).await {
                tracing::warn!(address = %succ_now.address, error = %e, "notify failed during stabilize");
            }
        }

        let k = self.table_len();
        if k > 1 {
            let i = 1 + (self.refresh_cursor.fetch_add(1, Ordering::Relaxed) % (k - 1));
            let start = self.self_finger.id.add_pow2(i as u32, self.m);
            match self.find_successor(start).await {
                Ok(f) => self.state.write().finger_table[i] = f,
                Err(e) => tracing::warn!(index = i, error = %e, "finger refresh failed during stabilize"),
            }
        }
    }

    /// Handles an incoming `Notify(candidate)`: adopts `candidate` as
    /// predecessor if the current predecessor is unknown (self) or
    /// `candidate` lies strictly between it and this node.
    pub fn handle_notify(&self, candidate: Finger) {
        let mut st = self.state.write();
        let pred = st.predecessor.clone();
        if pred.id == self.self_finger.id
            || in_arc(pred.id, self.self_finger.id, candidate.id, false, false, self.m)
        {
            st.predecessor = candidate;
        }
    }

    /// `FindPredecessor(id)` RPC handler: this node's own
    /// `closest_preceding_finger`, per spec §4.3's definition of that
    /// RPC (not a full recursive lookup run remotely).
    pub async fn handle_find_predecessor(&self, id: Identifier) -> Finger {
        self.closest_preceding_finger(id).await
    }

    pub fn handle_get_successor(&self) -> Finger {
        self.successor()
    }

    pub fn handle_get_predecessor(&self) -> Finger {
        self.predecessor()
    }
}

fn transport_err(address: &str, e: TransportError) -> Error {
    match e {
        TransportError::Unreachable(msg) => {
            Error::network_unreachable(format!("{address}: {msg}"))
        }
        TransportError::Timeout(msg) => Error::timeout(format!("{address}: {msg}")),
    }
}
