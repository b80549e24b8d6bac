//! `erasure::ShardTransport` over QUIC: the per-shard `Write`/`Read`/
//! `Delete`/`FindSuccessorInRing` calls an `ErasureClient` makes against
//! whichever host a shard hashes to.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use quinn::Endpoint;

use corelib::{Capability, Identifier};
use erasure::ShardTransport;
use streaming::{
    DeleteRequest, DeleteResult, FindSuccessorInRingRequest, FindSuccessorInRingResult, PingReply,
    PingRequest, ReadChunk, ReadReplyHeaderResult, ReadRequest, Request, StreamingError,
    WriteChunk, WriteHeader, WriteResult,
};

use crate::error::PeerError;

/// One dial per RPC, same as `QuicRingTransport` — shard RPCs are
/// already retried with backoff one level up in `erasure::client`, so
/// this layer stays dumb and just moves bytes.
pub struct QuicShardTransport {
    endpoint: Endpoint,
    deadline: Duration,
}

impl QuicShardTransport {
    pub fn new(endpoint: Endpoint, deadline: Duration) -> Self {
        Self { endpoint, deadline }
    }

    async fn connect(&self, host: &str) -> Result<quinn::Connection, PeerError> {
        let addr: SocketAddr = host
            .parse()
            .map_err(|e| PeerError::InvalidAddress(host.to_string(), e))?;
        let connecting = self
            .endpoint
            .connect(addr, "localhost")
            .map_err(|e| StreamingError::Config(e.to_string()))?;
        let connection = tokio::time::timeout(self.deadline, connecting)
            .await
            .map_err(|_| PeerError::Timeout(host.to_string()))?
            .map_err(StreamingError::from)?;
        Ok(connection)
    }

    async fn open(
        &self,
        host: &str,
    ) -> Result<(streaming::StreamSender, streaming::StreamReceiver), PeerError> {
        let conn = self.connect(host).await?;
        let (send, recv) = tokio::time::timeout(self.deadline, conn.open_bi())
            .await
            .map_err(|_| PeerError::Timeout(host.to_string()))?
            .map_err(StreamingError::from)?;
        Ok((streaming::StreamSender::new(send), streaming::StreamReceiver::new(recv)))
    }

    async fn recv<T: serde::de::DeserializeOwned>(
        &self,
        host: &str,
        receiver: &mut streaming::StreamReceiver,
    ) -> Result<T, PeerError> {
        tokio::time::timeout(self.deadline, receiver.recv())
            .await
            .map_err(|_| PeerError::Timeout(host.to_string()))?
            .map_err(PeerError::from)
    }
}

fn to_shard_err(e: PeerError) -> erasure::ShardTransportError {
    use corelib::ErrorKind;
    match e.kind() {
        ErrorKind::Timeout => erasure::ShardTransportError::Timeout(e.to_string()),
        ErrorKind::PermissionDenied => erasure::ShardTransportError::PermissionDenied(e.to_string()),
        ErrorKind::SizeViolation => erasure::ShardTransportError::SizeViolation(e.to_string()),
        _ => erasure::ShardTransportError::Unreachable(e.to_string()),
    }
}

fn rpc_to_shard_err(e: streaming::RpcError) -> erasure::ShardTransportError {
    to_shard_err(PeerError::Core(e.into()))
}

#[async_trait]
impl ShardTransport for QuicShardTransport {
    async fn find_successor_in_ring(
        &self,
        ring_entry: &str,
        id: Identifier,
    ) -> Result<String, erasure::ShardTransportError> {
        let (mut sender, mut receiver) = self.open(ring_entry).await.map_err(to_shard_err)?;
        sender
            .send(&Request::FindSuccessorInRing(FindSuccessorInRingRequest { id }))
            .await
            .map_err(|e| to_shard_err(e.into()))?;
        sender.finish().await.map_err(|e| to_shard_err(e.into()))?;

        let reply: FindSuccessorInRingResult =
            self.recv(ring_entry, &mut receiver).await.map_err(to_shard_err)?;
        Ok(reply.map_err(rpc_to_shard_err)?.address)
    }

    async fn write_shard(
        &self,
        host: &str,
        name: &str,
        capability: Capability,
        data: Vec<u8>,
    ) -> Result<u64, erasure::ShardTransportError> {
        let (mut sender, mut receiver) = self.open(host).await.map_err(to_shard_err)?;
        sender
            .send(&Request::Write(WriteHeader {
                name: name.to_string(),
                capability,
            }))
            .await
            .map_err(|e| to_shard_err(e.into()))?;
        sender
            .send(&WriteChunk { data })
            .await
            .map_err(|e| to_shard_err(e.into()))?;
        sender.finish().await.map_err(|e| to_shard_err(e.into()))?;

        let reply: WriteResult = self.recv(host, &mut receiver).await.map_err(to_shard_err)?;
        Ok(reply.map_err(rpc_to_shard_err)?.written)
    }

    async fn read_shard(
        &self,
        host: &str,
        name: &str,
        chunk_size: u32,
        capability: Capability,
    ) -> Result<Option<Vec<u8>>, erasure::ShardTransportError> {
        let (mut sender, mut receiver) = self.open(host).await.map_err(to_shard_err)?;
        sender
            .send(&Request::Read(ReadRequest {
                name: name.to_string(),
                chunk_size,
                capability,
            }))
            .await
            .map_err(|e| to_shard_err(e.into()))?;
        sender.finish().await.map_err(|e| to_shard_err(e.into()))?;

        let header: ReadReplyHeaderResult = self.recv(host, &mut receiver).await.map_err(to_shard_err)?;
        let header = header.map_err(rpc_to_shard_err)?;
        if !header.exists {
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            match self.recv::<ReadChunk>(host, &mut receiver).await {
                Ok(chunk) => buf.extend_from_slice(&chunk.data[..chunk.size as usize]),
                Err(PeerError::Streaming(StreamingError::UnexpectedEof)) => break,
                Err(e) => return Err(to_shard_err(e)),
            }
        }
        Ok(Some(buf))
    }

    async fn delete_shard(
        &self,
        host: &str,
        name: &str,
        capability: Capability,
    ) -> Result<(), erasure::ShardTransportError> {
        let (mut sender, mut receiver) = self.open(host).await.map_err(to_shard_err)?;
        sender
            .send(&Request::Delete(DeleteRequest {
                name: name.to_string(),
                capability,
            }))
            .await
            .map_err(|e| to_shard_err(e.into()))?;
        sender.finish().await.map_err(|e| to_shard_err(e.into()))?;

        let reply: DeleteResult = self.recv(host, &mut receiver).await.map_err(to_shard_err)?;
        reply.map_err(rpc_to_shard_err)?;
        Ok(())
    }
}

/// Liveness probe, not part of `ShardTransport` but used the same way
/// (`peer::stabilize` and manual ops tooling ping a host before trusting
/// it).
impl QuicShardTransport {
    pub async fn ping(&self, host: &str) -> Result<bool, PeerError> {
        let (mut sender, mut receiver) = self.open(host).await?;
        sender.send(&Request::Ping(PingRequest { ok: true })).await?;
        sender.finish().await?;
        let reply: PingReply = self.recv(host, &mut receiver).await?;
        Ok(reply.ok)
    }
}
