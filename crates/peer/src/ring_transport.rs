//! `corelib::RingTransport` over QUIC: the outbound calls a `RingNode`
//! makes against other nodes' `PeerService`s to drive lookup, join, and
//! stabilization.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use quinn::Endpoint;

use corelib::ring::{RingTransport, TransportError};
use corelib::{hash, Finger, Identifier};
use streaming::{
    FindPredecessorRequest, FindSuccessorInRingRequest, FindSuccessorInRingResult, FingerReply,
    NotifyRequest, Request, StreamReceiver, StreamSender,
};

/// One RPC, one dial: per spec §5 ("connection pooling is an optional
/// optimization and not a correctness requirement"), every call here
/// opens a fresh QUIC connection and closes it when the stream
/// finishes.
pub struct QuicRingTransport {
    endpoint: Endpoint,
    deadline: Duration,
    m: u64,
}

impl QuicRingTransport {
    pub fn new(endpoint: Endpoint, deadline: Duration, m: u64) -> Self {
        Self { endpoint, deadline, m }
    }

    async fn open_stream(&self, address: &str) -> Result<(StreamSender, StreamReceiver), TransportError> {
        let socket_addr: SocketAddr = address
            .parse()
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;

        let connecting = self
            .endpoint
            .connect(socket_addr, "localhost")
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;

        let connection = tokio::time::timeout(self.deadline, connecting)
            .await
            .map_err(|_| TransportError::Timeout(address.to_string()))?
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;

        let (send, recv) = tokio::time::timeout(self.deadline, connection.open_bi())
            .await
            .map_err(|_| TransportError::Timeout(address.to_string()))?
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;

        Ok((StreamSender::new(send), StreamReceiver::new(recv)))
    }

    async fn call<Rep>(&self, address: &str, request: Request) -> Result<Rep, TransportError>
    where
        Rep: serde::de::DeserializeOwned,
    {
        let (mut sender, mut receiver) = self.open_stream(address).await?;
        sender
            .send(&request)
            .await
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;
        sender
            .finish()
            .await
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;

        tokio::time::timeout(self.deadline, receiver.recv())
            .await
            .map_err(|_| TransportError::Timeout(address.to_string()))?
            .map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))
    }
}

fn to_finger(reply: FingerReply) -> Finger {
    Finger::new(reply.id, reply.address)
}

#[async_trait]
impl RingTransport for QuicRingTransport {
    async fn get_successor(&self, address: &str) -> Result<Finger, TransportError> {
        let reply: FingerReply = self.call(address, Request::GetSuccessor).await?;
        Ok(to_finger(reply))
    }

    async fn get_predecessor(&self, address: &str) -> Result<Finger, TransportError> {
        let reply: FingerReply = self.call(address, Request::GetPredecessor).await?;
        Ok(to_finger(reply))
    }

    async fn find_predecessor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError> {
        let reply: FingerReply = self
            .call(address, Request::FindPredecessor(FindPredecessorRequest { id }))
            .await?;
        Ok(to_finger(reply))
    }

    async fn notify(&self, address: &str, candidate: Finger) -> Result<(), TransportError> {
        let _: () = self
            .call(
                address,
                Request::Notify(NotifyRequest {
                    address: candidate.address,
                    id: candidate.id,
                }),
            )
            .await?;
        Ok(())
    }

    async fn find_successor(&self, address: &str, id: Identifier) -> Result<Finger, TransportError> {
        let reply: FindSuccessorInRingResult = self
            .call(
                address,
                Request::FindSuccessorInRing(FindSuccessorInRingRequest { id }),
            )
            .await?;
        let reply = reply.map_err(|e| TransportError::Unreachable(format!("{address}: {e}")))?;
        // Per spec's wire table, `FindSuccessorInRing` replies with only
        // `{addr}` — the id is re-derived by hashing it, the same way
        // every node derives its own id from its own address.
        let resolved_id = hash(reply.address.as_bytes(), self.m);
        Ok(Finger::new(resolved_id, reply.address))
    }
}
