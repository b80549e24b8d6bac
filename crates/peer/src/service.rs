//! `PeerService`: the server-side handler for every RPC in spec §6's
//! wire table. Every `Write`/`Read`/`Delete` call verifies the
//! capability presented in its opening message before touching the
//! `ShardStore`; a verification failure never reaches the disk.

use std::sync::Arc;

use corelib::{Action, Capability, Error as CoreError, ErrorKind, Finger, RingNode};
use shardstore::ShardStore;
use streaming::{
    DeleteReply, DeleteRequest, DeleteResult, FindSuccessorInRingReply, FindSuccessorInRingRequest,
    FindSuccessorInRingResult, FingerReply, NotifyRequest, PingReply, PingRequest, ReadChunk,
    ReadReplyHeader, ReadReplyHeaderResult, ReadRequest, Request, RpcError, StreamReceiver,
    StreamSender, StreamingError, WriteChunk, WriteHeader, WriteReply, WriteResult,
};

use crate::ring_transport::QuicRingTransport;

/// Default size of a `Read` response's chunk buffer when a caller asks
/// for a `chunk_size` of `0`; mirrors `ShardStore::read`'s own floor.
const MIN_READ_CHUNK: u32 = 1;

/// Owns exactly the per-node state spec §3 "Ownership" assigns to a
/// node: its `RingNode` (finger table, predecessor), its `ShardStore`,
/// and the capability signing key. Cheap to clone — everything behind
/// it is already reference-counted or `Copy`.
#[derive(Clone)]
pub struct PeerService {
    ring: Arc<RingNode<QuicRingTransport>>,
    store: ShardStore,
    key: Arc<Vec<u8>>,
}

impl PeerService {
    pub fn new(ring: Arc<RingNode<QuicRingTransport>>, store: ShardStore, key: Arc<Vec<u8>>) -> Self {
        Self { ring, store, key }
    }

    pub fn ring(&self) -> &Arc<RingNode<QuicRingTransport>> {
        &self.ring
    }

    fn verify(&self, capability: &Capability, name: &str, action: Action) -> Result<(), RpcError> {
        capability
            .verify(&self.key, name, capability.size, action, None)
            .map_err(|e| RpcError {
                kind: ErrorKind::PermissionDenied,
                message: format!("{e:?}"),
            })
    }

    /// Dispatches one RPC: reads the opening `Request` already drained
    /// by the caller and drives whatever follow-on messages that RPC
    /// kind needs.
    pub async fn handle(&self, request: Request, sender: &mut StreamSender, receiver: &mut StreamReceiver) {
        let outcome = match request {
            Request::GetSuccessor => self.handle_get_successor(sender).await,
            Request::GetPredecessor => self.handle_get_predecessor(sender).await,
            Request::FindPredecessor(req) => self.handle_find_predecessor(req.id, sender).await,
            Request::Notify(req) => self.handle_notify(req, sender).await,
            Request::FindSuccessorInRing(req) => self.handle_find_successor_in_ring(req, sender).await,
            Request::Write(header) => self.handle_write(header, sender, receiver).await,
            Request::Read(req) => self.handle_read(req, sender).await,
            Request::Delete(req) => self.handle_delete(req, sender).await,
            Request::Ping(req) => self.handle_ping(req, sender).await,
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, "peer rpc handler failed to reply");
        }
    }

    async fn handle_get_successor(&self, sender: &mut StreamSender) -> Result<(), StreamingError> {
        let succ = self.ring.successor();
        sender.send(&finger_reply(succ)).await
    }

    async fn handle_get_predecessor(&self, sender: &mut StreamSender) -> Result<(), StreamingError> {
        let pred = self.ring.predecessor();
        sender.send(&finger_reply(pred)).await
    }

    async fn handle_find_predecessor(
        &self,
        id: corelib::Identifier,
        sender: &mut StreamSender,
    ) -> Result<(), StreamingError> {
        let pred = self.ring.handle_find_predecessor(id).await;
        sender.send(&finger_reply(pred)).await
    }

    async fn handle_notify(&self, req: NotifyRequest, sender: &mut StreamSender) -> Result<(), StreamingError> {
        self.ring.handle_notify(Finger::new(req.id, req.address));
        sender.send(&()).await
    }

    async fn handle_find_successor_in_ring(
        &self,
        req: FindSuccessorInRingRequest,
        sender: &mut StreamSender,
    ) -> Result<(), StreamingError> {
        let reply: FindSuccessorInRingResult = self
            .ring
            .find_successor(req.id)
            .await
            .map(|f| FindSuccessorInRingReply { address: f.address })
            .map_err(RpcError::from);
        sender.send(&reply).await
    }

    async fn handle_write(
        &self,
        header: WriteHeader,
        sender: &mut StreamSender,
        receiver: &mut StreamReceiver,
    ) -> Result<(), StreamingError> {
        let reply = self.do_write(header, receiver).await;
        sender.send(&reply).await
    }

    async fn do_write(&self, header: WriteHeader, receiver: &mut StreamReceiver) -> WriteResult {
        self.verify(&header.capability, &header.name, Action::Write)?;

        let mut chunks = Vec::new();
        let mut total = 0u64;
        loop {
            match receiver.recv::<WriteChunk>().await {
                Ok(chunk) => {
                    total += chunk.data.len() as u64;
                    chunks.push(chunk.data);
                }
                Err(StreamingError::UnexpectedEof) => break,
                Err(e) => return Err(core_rpc_err(e.kind(), e.to_string())),
            }
        }

        if total as i64 != header.capability.size {
            let _ = self.store.delete(header.name.clone()).await;
            return Err(RpcError {
                kind: ErrorKind::SizeViolation,
                message: format!(
                    "declared size {} does not match {} bytes received",
                    header.capability.size, total
                ),
            });
        }

        let written = self
            .store
            .write(header.name, chunks)
            .await
            .map_err(|e| core_rpc_err(e.kind(), e.to_string()))?;
        Ok(WriteReply { written })
    }

    async fn handle_read(&self, req: ReadRequest, sender: &mut StreamSender) -> Result<(), StreamingError> {
        let verify_result = self.verify(&req.capability, &req.name, Action::Read);
        let header: ReadReplyHeaderResult = match &verify_result {
            Ok(()) => Ok(ReadReplyHeader { exists: true }),
            Err(e) => Err(e.clone()),
        };

        match verify_result {
            Err(_) => {
                // A permission failure still needs a header frame, but
                // the `exists` flag inside it is meaningless; callers
                // must check the outer Result first.
                return sender.send(&header).await;
            }
            Ok(()) => {}
        }

        let chunk_size = req.chunk_size.max(MIN_READ_CHUNK) as usize;
        let chunks = self
            .store
            .read(req.name.clone(), chunk_size)
            .await
            .map_err(|e| core_rpc_err(e.kind(), e.to_string()));

        let chunks = match chunks {
            Ok(Some(chunks)) => chunks,
            Ok(None) => {
                sender.send(&Ok::<_, RpcError>(ReadReplyHeader { exists: false })).await?;
                return Ok(());
            }
            Err(e) => {
                sender.send(&Err::<ReadReplyHeader, _>(e)).await?;
                return Ok(());
            }
        };

        sender.send(&Ok::<_, RpcError>(ReadReplyHeader { exists: true })).await?;
        for chunk in chunks {
            let size = chunk.len() as u32;
            sender.send(&ReadChunk { data: chunk, size }).await?;
        }
        Ok(())
    }

    async fn handle_delete(&self, req: DeleteRequest, sender: &mut StreamSender) -> Result<(), StreamingError> {
        let reply: DeleteResult = match self.verify(&req.capability, &req.name, Action::Delete) {
            Ok(()) => self
                .store
                .delete(req.name)
                .await
                .map(|_| DeleteReply)
                .map_err(|e| core_rpc_err(e.kind(), e.to_string())),
            Err(e) => Err(e),
        };
        sender.send(&reply).await
    }

    async fn handle_ping(&self, req: PingRequest, sender: &mut StreamSender) -> Result<(), StreamingError> {
        sender.send(&PingReply { ok: req.ok }).await
    }
}

fn finger_reply(f: Finger) -> FingerReply {
    FingerReply {
        address: f.address,
        id: f.id,
    }
}

fn core_rpc_err(kind: ErrorKind, message: String) -> RpcError {
    RpcError { kind, message }
}
