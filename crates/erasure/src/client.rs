//! `ErasureClient`: splits a file into `D` data + `P` parity shards,
//! locates each shard's host via the ring, and uploads/downloads/deletes
//! with partial-failure tolerance (spec §4.6).

use std::sync::Arc;

use corelib::{hash, Action, Capability, Identifier};

use crate::backoff::with_retry;
use crate::codec;
use crate::error::Error;
use crate::transport::ShardTransport;

/// Defaults from spec §6: `D=8` data shards, `P=2` parity shards.
pub const DEFAULT_DATA_SHARDS: usize = 8;
pub const DEFAULT_PARITY_SHARDS: usize = 2;

pub struct ErasureClient<T: ShardTransport> {
    ring_entry: String,
    transport: Arc<T>,
    key: Arc<Vec<u8>>,
    d: usize,
    p: usize,
    m: u64,
}

impl<T: ShardTransport> ErasureClient<T> {
    pub fn new(
        ring_entry: impl Into<String>,
        transport: Arc<T>,
        key: Vec<u8>,
        d: usize,
        p: usize,
        m: u64,
    ) -> Self {
        Self {
            ring_entry: ring_entry.into(),
            transport,
            key: Arc::new(key),
            d,
            p,
            m,
        }
    }

    pub fn with_defaults(ring_entry: impl Into<String>, transport: Arc<T>, key: Vec<u8>, m: u64) -> Self {
        Self::new(ring_entry, transport, key, DEFAULT_DATA_SHARDS, DEFAULT_PARITY_SHARDS, m)
    }

    pub fn data_shards(&self) -> usize {
        self.d
    }

    pub fn parity_shards(&self) -> usize {
        self.p
    }

    fn shard_name(name: &str, i: usize) -> String {
        format!("{name}_rep{i}")
    }

    fn shard_id(&self, shard_name: &str) -> Identifier {
        hash(shard_name.as_bytes(), self.m)
    }

    async fn locate(&self, shard_name: &str) -> Result<String, Error> {
        let id = self.shard_id(shard_name);
        let ring_entry = self.ring_entry.clone();
        with_retry(|| {
            let ring_entry = ring_entry.clone();
            async move {
                self.transport
                    .find_successor_in_ring(&ring_entry, id)
                    .await
                    .map_err(Error::from)
            }
        })
        .await
    }

    /// Encodes `content` into `D + P` shards and streams each to the
    /// host its shard name hashes to. Fails fast on any per-shard error;
    /// shards already uploaded are left in place (spec §4.6: "partial
    /// uploads are left in place, cleanup is the caller's responsibility").
    pub async fn upload_file_rsc(&self, name: &str, content: &[u8]) -> Result<(), Error> {
        let shards = codec::encode(content, self.d, self.p)?;

        for (i, shard) in shards.into_iter().enumerate() {
            let shard_name = Self::shard_name(name, i);
            let host = self.locate(&shard_name).await?;
            let cap = Capability::mint(shard_name.clone(), shard.len() as i64, Action::Write, &self.key);
            let bytes = shard.len();

            with_retry(|| {
                let host = host.clone();
                let shard_name = shard_name.clone();
                let cap = cap.clone();
                let shard = shard.clone();
                async move {
                    self.transport
                        .write_shard(&host, &shard_name, cap, shard)
                        .await
                        .map_err(Error::from)
                }
            })
            .await?;

            tracing::debug!(shard = %shard_name, host = %host, bytes, "shard uploaded");
        }

        Ok(())
    }

    /// Downloads every shard of `name` (a file originally `original_len`
    /// bytes long — the only carrier of that length per spec's Design
    /// Note on padding recovery, typically read off the caller's
    /// capability), reconstructs missing data shards via Reed-Solomon,
    /// and returns the original bytes with trailing padding trimmed.
    pub async fn download_file_rsc(&self, name: &str, original_len: usize) -> Result<Vec<u8>, Error> {
        let total = self.d + self.p;
        let shard_len = codec::shard_len(original_len, self.d);
        let mut shards: Vec<Option<Vec<u8>>> = Vec::with_capacity(total);
        let mut missing = 0usize;

        for i in 0..total {
            let shard_name = Self::shard_name(name, i);
            let host = self.locate(&shard_name).await?;
            let cap = Capability::mint(shard_name.clone(), shard_len as i64, Action::Read, &self.key);

            let outcome = with_retry(|| {
                let host = host.clone();
                let shard_name = shard_name.clone();
                let cap = cap.clone();
                async move {
                    self.transport
                        .read_shard(&host, &shard_name, shard_len as u32, cap)
                        .await
                        .map_err(Error::from)
                }
            })
            .await;

            match outcome {
                Ok(Some(data)) => shards.push(Some(data)),
                Ok(None) => {
                    tracing::warn!(shard = %shard_name, "shard missing, recording nil for reconstruction");
                    shards.push(None);
                    missing += 1;
                }
                Err(e) => return Err(e),
            }
        }

        codec::ensure_recoverable(missing, self.p)?;
        codec::reconstruct(shards, self.d, self.p, original_len)
    }

    /// Buffer-oriented form of `download_file_rsc`, mirroring the
    /// distilled source's fixed-buffer `DownloadFileRSC`: rejects a
    /// buffer smaller than `original_len` with `BufferTooSmall` and
    /// reports how many trailing bytes of `buffer` went unused.
    pub async fn download_file_rsc_into(
        &self,
        name: &str,
        original_len: usize,
        buffer: &mut [u8],
    ) -> Result<usize, Error> {
        if buffer.len() < original_len {
            return Err(Error::BufferTooSmall {
                needed: original_len,
                have: buffer.len(),
            });
        }
        let data = self.download_file_rsc(name, original_len).await?;
        let written = data.len();
        buffer[..written].copy_from_slice(&data);
        Ok(buffer.len() - written)
    }

    async fn delete_one_shard(&self, shard_name: &str) -> Result<(), Error> {
        let host = self.locate(shard_name).await?;
        let cap = Capability::mint(shard_name.to_string(), 0, Action::Delete, &self.key);

        with_retry(|| {
            let host = host.clone();
            let shard_name = shard_name.to_string();
            let cap = cap.clone();
            async move {
                self.transport
                    .delete_shard(&host, &shard_name, cap)
                    .await
                    .map_err(Error::from)
            }
        })
        .await
    }

    /// Deletes every shard of `name`. Per-shard capabilities are minted
    /// with `size = 0`: a delete has no independent "declared length" to
    /// bind, so the server's verifier checks name and action against the
    /// token and treats its `size` field as a fixed convention rather
    /// than a caller-supplied expectation.
    ///
    /// Every shard is attempted even if an earlier one fails (spec §4.6:
    /// "aggregate errors; success requires all deletes to succeed"), so a
    /// single unreachable host doesn't hide the outcome of the rest.
    pub async fn delete_file_rsc(&self, name: &str) -> Result<(), Error> {
        let total = self.d + self.p;
        let mut failures = Vec::new();

        for i in 0..total {
            let shard_name = Self::shard_name(name, i);
            if let Err(e) = self.delete_one_shard(&shard_name).await {
                failures.push((shard_name, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::DeleteFailed { failures, total })
        }
    }
}
