//! Payload storage: the object-store seam and its on-disk implementation.
//!
//! Payloads are durable metadata-free blobs keyed by generated storage
//! paths and sharded beneath `base_path/{shard}/{shard}/{path}`. The seam
//! is a trait so tests can substitute failing or recording stores.

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use uuid::Uuid;

const MAX_STORAGE_PATH_LEN: usize = 1024;

/// Outcome of a durable payload write.
#[derive(Debug, Clone)]
pub struct StoredPayload {
    pub size_bytes: i64,
    /// MD5 of the payload, hex-encoded.
    pub etag: String,
}

/// External collaborator holding raw payload bytes by storage path.
///
/// `put` must be durable before it returns; a path handed to `put` is never
/// reused for different bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes) -> io::Result<StoredPayload>;

    async fn get(&self, path: &str) -> io::Result<Bytes>;

    /// Resolve a storage path to a URL the client can fetch directly.
    fn public_url(&self, path: &str) -> String;
}

/// Disk-backed object store serving payloads from `base_path`.
#[derive(Clone)]
pub struct FsObjectStore {
    base_path: PathBuf,
    /// Prefix public URLs are resolved under, e.g. `/media`.
    url_prefix: String,
}

impl FsObjectStore {
    pub fn new(base_path: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Basic path validation to avoid trivial traversal vectors.
    ///
    /// Storage paths are generated server-side, but the public media route
    /// accepts client-supplied paths, so reads go through the same check.
    fn ensure_path_safe(path: &str) -> io::Result<()> {
        if path.is_empty() || path.len() > MAX_STORAGE_PATH_LEN {
            return Err(io::Error::new(ErrorKind::InvalidInput, "invalid storage path"));
        }
        if path.starts_with('/') || path.contains("..") {
            return Err(io::Error::new(ErrorKind::InvalidInput, "invalid storage path"));
        }
        if path
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(io::Error::new(ErrorKind::InvalidInput, "invalid storage path"));
        }
        Ok(())
    }

    /// Generate two-level shard identifiers for a storage path.
    ///
    /// First two bytes of MD5(path) as lowercase hex. Bounds the file count
    /// per directory.
    fn shards(path: &str) -> (String, String) {
        let digest = md5::compute(path);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Fully-qualified payload location beneath the base path.
    fn payload_path(&self, path: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::shards(path);
        let mut full = self.base_path.clone();
        full.push(shard_a);
        full.push(shard_b);
        full.push(path);
        full
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    /// Write a payload durably: bytes go to a temporary file, are fsynced,
    /// then atomically renamed into place. Temp files are cleaned up on
    /// every failure path.
    async fn put(&self, path: &str, bytes: Bytes) -> io::Result<StoredPayload> {
        Self::ensure_path_safe(path)?;

        let file_path = self.payload_path(path);
        let parent = file_path
            .parent()
            .map(PathBuf::from)
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "payload path missing parent"))?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let digest = md5::compute(&bytes);
        if let Err(err) = file.write_all(&bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }

        Ok(StoredPayload {
            size_bytes: bytes.len() as i64,
            etag: format!("{:x}", digest),
        })
    }

    async fn get(&self, path: &str) -> io::Result<Bytes> {
        Self::ensure_path_safe(path)?;
        let file_path = self.payload_path(path);
        let contents = fs::read(&file_path).await?;
        Ok(Bytes::from(contents))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), path)
    }
}
