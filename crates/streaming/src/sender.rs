//! Send half of a QUIC bidirectional stream, paired with the
//! length-prefixed codec.

use quinn::SendStream;
use serde::Serialize;

use crate::codec::write_frame;
use crate::error::StreamingError;

pub struct StreamSender {
    send: SendStream,
}

impl StreamSender {
    pub fn new(send: SendStream) -> Self {
        Self { send }
    }

    pub async fn send<T: Serialize>(&mut self, value: &T) -> Result<(), StreamingError> {
        write_frame(&mut self.send, value).await
    }

    /// Half-closes the stream: the client side of this signals "no more
    /// chunks" to end a `Write` stream, per spec §4.5.
    pub async fn finish(&mut self) -> Result<(), StreamingError> {
        self.send.finish().await?;
        Ok(())
    }
}
