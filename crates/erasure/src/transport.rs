//! The outbound surface `ErasureClient` needs against the ring and
//! against individual shard hosts, kept as a trait so this crate has no
//! dependency on the QUIC transport — `peer`'s client is the real
//! implementation, tests here use an in-process fake.

use corelib::{Capability, Identifier};

use crate::error::ShardTransportError;

#[async_trait::async_trait]
pub trait ShardTransport: Send + Sync {
    /// `FindSuccessorInRing`: resolves `id` to a host address by asking
    /// any node already in the ring (`ring_entry`).
    async fn find_successor_in_ring(
        &self,
        ring_entry: &str,
        id: Identifier,
    ) -> Result<String, ShardTransportError>;

    /// Streams `data` to `host` under `name`, presenting `capability`.
    /// Returns the number of bytes the host reports written.
    async fn write_shard(
        &self,
        host: &str,
        name: &str,
        capability: Capability,
        data: Vec<u8>,
    ) -> Result<u64, ShardTransportError>;

    /// Reads `name` from `host` in chunks of at most `chunk_size`.
    /// `Ok(None)` means the host reported the shard doesn't exist.
    async fn read_shard(
        &self,
        host: &str,
        name: &str,
        chunk_size: u32,
        capability: Capability,
    ) -> Result<Option<Vec<u8>>, ShardTransportError>;

    /// Deletes `name` on `host`. Idempotent: a host reporting the shard
    /// never existed is not an error.
    async fn delete_shard(
        &self,
        host: &str,
        name: &str,
        capability: Capability,
    ) -> Result<(), ShardTransportError>;
}
