//! Length-prefixed framing: a big-endian `u32` byte length followed by a
//! bincode payload. Used for every message on a QUIC bidirectional
//! stream — request headers, write/read chunks, and replies alike.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::StreamingError;

/// Frames larger than this are rejected outright rather than trusting a
/// remote-supplied length prefix to allocate an unbounded buffer.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), StreamingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(value)?;
    let len = payload.len() as u32;
    if len > MAX_FRAME_LEN {
        return Err(StreamingError::MessageTooLarge(len, MAX_FRAME_LEN));
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    Ok(())
}

pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, StreamingError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    read_exact_or_eof(reader, &mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(StreamingError::MessageTooLarge(len, MAX_FRAME_LEN));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}

/// Like `AsyncReadExt::read_exact`, but an EOF on the very first byte of
/// a frame is a clean stream end (`UnexpectedEof`), not an I/O error —
/// that's how a `Read`/`Write` stream's caller learns the peer is done.
async fn read_exact_or_eof<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<(), StreamingError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Err(StreamingError::UnexpectedEof);
            }
            return Err(StreamingError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "frame truncated mid-length-prefix",
            )));
        }
        filled += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Ping {
        ok: bool,
    }

    #[tokio::test]
    async fn round_trips_a_value() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Ping { ok: true }).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let decoded: Ping = read_frame(&mut cursor).await.unwrap();
        assert_eq!(decoded, Ping { ok: true });
    }

    #[tokio::test]
    async fn clean_eof_before_any_bytes_is_unexpected_eof() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let result: Result<Ping, _> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(StreamingError::UnexpectedEof)));
    }
}
