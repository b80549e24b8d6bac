//! Erasure-coded file plane: Reed-Solomon shard splitting/reconstruction
//! and the `ErasureClient` upload/download/delete flows (spec §4.6).

mod backoff;
pub mod client;
pub mod codec;
pub mod error;
pub mod transport;

pub use client::{ErasureClient, DEFAULT_DATA_SHARDS, DEFAULT_PARITY_SHARDS};
pub use error::{Error, ShardTransportError};
pub use transport::ShardTransport;

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Action, Capability};
    use parking_lot::Mutex;
    use rand::RngCore;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    const M: u64 = 1000;
    const KEY: &[u8] = b"test-key-not-used-in-prod-123456";

    fn random_bytes(len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }

    #[derive(Default)]
    struct FakeHost {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    /// A single-host fake: every shard lands on the same place, and the
    /// test controls which shards are "missing" by deleting them before
    /// download, the same way the real integration tests delete on-disk
    /// shard files.
    struct FakeTransport {
        host: FakeHost,
        fail_deletes: Mutex<HashSet<String>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                host: FakeHost::default(),
                fail_deletes: Mutex::new(HashSet::new()),
            }
        }

        fn remove_shard(&self, name: &str) {
            self.host.files.lock().remove(name);
        }

        fn fail_delete(&self, name: &str) {
            self.fail_deletes.lock().insert(name.to_string());
        }
    }

    #[async_trait::async_trait]
    impl ShardTransport for FakeTransport {
        async fn find_successor_in_ring(
            &self,
            _ring_entry: &str,
            _id: corelib::Identifier,
        ) -> Result<String, ShardTransportError> {
            Ok("single-host".to_string())
        }

        async fn write_shard(
            &self,
            _host: &str,
            name: &str,
            capability: Capability,
            data: Vec<u8>,
        ) -> Result<u64, ShardTransportError> {
            capability
                .verify(KEY, name, data.len() as i64, Action::Write, None)
                .map_err(|e| ShardTransportError::PermissionDenied(format!("{e:?}")))?;
            let len = data.len() as u64;
            self.host.files.lock().insert(name.to_string(), data);
            Ok(len)
        }

        async fn read_shard(
            &self,
            _host: &str,
            name: &str,
            _chunk_size: u32,
            capability: Capability,
        ) -> Result<Option<Vec<u8>>, ShardTransportError> {
            let expected_size = capability.size;
            capability
                .verify(KEY, name, expected_size, Action::Read, None)
                .map_err(|e| ShardTransportError::PermissionDenied(format!("{e:?}")))?;
            Ok(self.host.files.lock().get(name).cloned())
        }

        async fn delete_shard(
            &self,
            _host: &str,
            name: &str,
            capability: Capability,
        ) -> Result<(), ShardTransportError> {
            capability
                .verify(KEY, name, capability.size, Action::Delete, None)
                .map_err(|e| ShardTransportError::PermissionDenied(format!("{e:?}")))?;
            if self.fail_deletes.lock().contains(name) {
                return Err(ShardTransportError::PermissionDenied(format!("{name}: injected failure")));
            }
            self.host.files.lock().remove(name);
            Ok(())
        }
    }

    #[tokio::test]
    async fn upload_then_download_recovers_exact_bytes() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport, KEY.to_vec(), M);

        let content = random_bytes(4096);
        client.upload_file_rsc("f.txt", &content).await.unwrap();

        let downloaded = client.download_file_rsc("f.txt", content.len()).await.unwrap();
        assert_eq!(downloaded, content);
    }

    #[tokio::test]
    async fn download_tolerates_up_to_p_missing_shards() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport.clone(), KEY.to_vec(), M);

        let content = random_bytes(4096);
        client.upload_file_rsc("g", &content).await.unwrap();

        transport.remove_shard("g_rep0");
        transport.remove_shard("g_rep3");

        let downloaded = client.download_file_rsc("g", content.len()).await.unwrap();
        assert_eq!(downloaded, content);
    }

    #[tokio::test]
    async fn more_than_p_missing_shards_is_too_many_corrupt() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport.clone(), KEY.to_vec(), M);

        let content = random_bytes(4096);
        client.upload_file_rsc("g", &content).await.unwrap();

        transport.remove_shard("g_rep0");
        transport.remove_shard("g_rep1");
        transport.remove_shard("g_rep2");

        let result = client.download_file_rsc("g", content.len()).await;
        assert!(matches!(result, Err(Error::TooManyCorrupt { .. })));
    }

    #[tokio::test]
    async fn buffer_too_small_is_reported() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport, KEY.to_vec(), M);

        let content = vec![1u8; 100];
        client.upload_file_rsc("small", &content).await.unwrap();

        let mut buf = vec![0u8; 10];
        let result = client.download_file_rsc_into("small", content.len(), &mut buf).await;
        assert!(matches!(result, Err(Error::BufferTooSmall { .. })));
    }

    #[tokio::test]
    async fn delete_removes_every_shard() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport.clone(), KEY.to_vec(), M);

        client.upload_file_rsc("d", &[1, 2, 3, 4]).await.unwrap();
        client.delete_file_rsc("d").await.unwrap();

        for i in 0..(DEFAULT_DATA_SHARDS + DEFAULT_PARITY_SHARDS) {
            assert!(!transport.host.files.lock().contains_key(&format!("d_rep{i}")));
        }
    }

    #[tokio::test]
    async fn delete_aggregates_failures_and_still_removes_other_shards() {
        let transport = Arc::new(FakeTransport::new());
        let client = ErasureClient::with_defaults("single-host", transport.clone(), KEY.to_vec(), M);

        client.upload_file_rsc("e", &[1, 2, 3, 4]).await.unwrap();
        transport.fail_delete("e_rep1");
        transport.fail_delete("e_rep4");

        let result = client.delete_file_rsc("e").await;
        let failures = match result {
            Err(Error::DeleteFailed { failures, total }) => {
                assert_eq!(total, DEFAULT_DATA_SHARDS + DEFAULT_PARITY_SHARDS);
                failures
            }
            other => panic!("expected DeleteFailed, got {other:?}"),
        };

        let failed_names: HashSet<_> = failures.into_iter().map(|(name, _)| name).collect();
        assert_eq!(failed_names, HashSet::from(["e_rep1".to_string(), "e_rep4".to_string()]));

        for i in 0..(DEFAULT_DATA_SHARDS + DEFAULT_PARITY_SHARDS) {
            let name = format!("e_rep{i}");
            if failed_names.contains(&name) {
                assert!(transport.host.files.lock().contains_key(&name));
            } else {
                assert!(!transport.host.files.lock().contains_key(&name));
            }
        }
    }
}
