//! Receive half of a QUIC bidirectional stream, paired with the
//! length-prefixed codec.

use quinn::RecvStream;
use serde::de::DeserializeOwned;

use crate::codec::read_frame;
use crate::error::StreamingError;

pub struct StreamReceiver {
    recv: RecvStream,
}

impl StreamReceiver {
    pub fn new(recv: RecvStream) -> Self {
        Self { recv }
    }

    /// Reads the next framed message. Returns `Err(UnexpectedEof)` once
    /// the peer has half-closed and no further frame follows — callers
    /// that expect a bounded sequence (e.g. `Write`'s chunk loop) treat
    /// that as the end-of-stream signal, not a failure.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T, StreamingError> {
        read_frame(&mut self.recv).await
    }
}
