//! Local filesystem-backed shard storage: one regular file per shard,
//! named verbatim, no header and no index (spec §6 "on-disk layout").

use std::fs::{self, File};
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;

/// Keyed by shard name. Every method has a blocking (`std::fs`-level)
/// form and an async form that runs the blocking form on
/// `tokio::task::spawn_blocking`, per spec §5 ("every disk I/O may
/// suspend") — the async server never blocks its reactor on a shard
/// write.
///
/// Cheap to clone: the store root is reference-counted, so handing a
/// clone into a `spawn_blocking` closure doesn't copy the path.
#[derive(Clone)]
pub struct ShardStore {
    root: Arc<PathBuf>,
}

impl ShardStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(Error::from_io)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::invalid_argument(format!(
                "shard name {name:?} must be a bare filename"
            )));
        }
        if name == "." || name == ".." {
            return Err(Error::invalid_argument(format!("invalid shard name {name:?}")));
        }
        Ok(self.root.join(name))
    }

    /// Writes `chunks` to `name` in order, durable before returning:
    /// the bytes land in a temp file in the store root, get `fsync`'d,
    /// then get renamed into place — a crash mid-write never leaves a
    /// partial file visible under its final name.
    pub fn write_blocking(&self, name: &str, chunks: &[Vec<u8>]) -> Result<u64, Error> {
        let path = self.resolve(name)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".shardstore-tmp-")
            .tempfile_in(&*self.root)
            .map_err(Error::from_io)?;

        let mut written = 0u64;
        for chunk in chunks {
            tmp.write_all(chunk).map_err(Error::from_io)?;
            written += chunk.len() as u64;
        }
        tmp.as_file().sync_all().map_err(Error::from_io)?;
        tmp.persist(&path).map_err(|e| Error::from_io(e.error))?;
        Ok(written)
    }

    pub fn exists_blocking(&self, name: &str) -> Result<bool, Error> {
        Ok(self.resolve(name)?.exists())
    }

    /// Idempotent: a missing file is success.
    pub fn delete_blocking(&self, name: &str) -> Result<(), Error> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from_io(e)),
        }
    }

    /// `None` if `name` doesn't exist; otherwise the file's bytes split
    /// into chunks of at most `chunk_size`, in file order.
    pub fn read_blocking(&self, name: &str, chunk_size: usize) -> Result<Option<Vec<Vec<u8>>>, Error> {
        let path = self.resolve(name)?;
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::from_io(e)),
        };

        let chunk_size = chunk_size.max(1);
        let mut chunks = Vec::new();
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = file.read(&mut buf).map_err(Error::from_io)?;
            if n == 0 {
                break;
            }
            chunks.push(buf[..n].to_vec());
        }
        Ok(Some(chunks))
    }

    /// Removes the partial file left by a write whose declared size
    /// didn't match what arrived (spec §4.5 `SizeViolation`).
    pub fn delete_partial_blocking(&self, name: &str) -> Result<(), Error> {
        self.delete_blocking(name)
    }

    pub async fn write(&self, name: String, chunks: Vec<Vec<u8>>) -> Result<u64, Error> {
        let store = self.clone();
        spawn_blocking(move || store.write_blocking(&name, &chunks)).await
    }

    pub async fn exists(&self, name: String) -> Result<bool, Error> {
        let store = self.clone();
        spawn_blocking(move || store.exists_blocking(&name)).await
    }

    pub async fn delete(&self, name: String) -> Result<(), Error> {
        let store = self.clone();
        spawn_blocking(move || store.delete_blocking(&name)).await
    }

    pub async fn read(&self, name: String, chunk_size: usize) -> Result<Option<Vec<Vec<u8>>>, Error> {
        let store = self.clone();
        spawn_blocking(move || store.read_blocking(&name, chunk_size)).await
    }
}

async fn spawn_blocking<F, T>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskPanicked(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ShardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ShardStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn write_then_read_returns_same_bytes() {
        let (_dir, store) = store();
        let chunks = vec![b"hello ".to_vec(), b"world".to_vec()];
        let written = store.write("f".to_string(), chunks).await.unwrap();
        assert_eq!(written, 11);

        let read_back = store.read("f".to_string(), 4).await.unwrap().unwrap();
        let flat: Vec<u8> = read_back.into_iter().flatten().collect();
        assert_eq!(flat, b"hello world");
    }

    #[tokio::test]
    async fn read_missing_reports_not_exists() {
        let (_dir, store) = store();
        assert!(store.read("nope".to_string(), 8).await.unwrap().is_none());
        assert!(!store.exists("nope".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store();
        store.write("f".to_string(), vec![b"x".to_vec()]).await.unwrap();
        store.delete("f".to_string()).await.unwrap();
        store.delete("f".to_string()).await.unwrap();
        assert!(!store.exists("f".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_last_writer_wins() {
        let (_dir, store) = store();
        store.write("f".to_string(), vec![b"first".to_vec()]).await.unwrap();
        store.write("f".to_string(), vec![b"second".to_vec()]).await.unwrap();
        let read_back = store.read("f".to_string(), 64).await.unwrap().unwrap();
        let flat: Vec<u8> = read_back.into_iter().flatten().collect();
        assert_eq!(flat, b"second");
    }

    #[test]
    fn rejects_path_separators_in_name() {
        let (_dir, store) = store();
        assert!(store.resolve("../escape").is_err());
        assert!(store.resolve("a/b").is_err());
    }
}
