//! Filesystem-backed cache store
//!
//! Layout: `<root>/<partition>/<digest>.meta` (JSON status + headers) next to
//! `<root>/<partition>/<digest>.data` (raw body). An entry is present only when
//! both files exist. Each file is written under a unique temporary name and
//! renamed into place, body first. The metadata records the SHA-256 of its
//! body, so a body paired with another write's metadata reads as a miss.

use super::{CacheEntry, CacheKey, CacheStore};
use crate::error::Result;
use crate::logger;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Persisted metadata record
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    status: u16,
    headers: Vec<(String, String)>,
    body_sha256: String,
}

/// Restart-durable cache rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) a cache rooted at `root`
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn entry_paths(&self, key: &CacheKey) -> (PathBuf, PathBuf) {
        let base = self.root.join(key.partition()).join(key.digest());
        (base.with_extension("meta"), base.with_extension("data"))
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let (meta_path, data_path) = self.entry_paths(key);

        let Some(meta_raw) = read_if_exists(&meta_path).await? else {
            return Ok(None);
        };
        let Some(body) = read_if_exists(&data_path).await? else {
            return Ok(None);
        };

        let meta: EntryMeta = match serde_json::from_slice(&meta_raw) {
            Ok(m) => m,
            Err(e) => {
                logger::log_warning(&format!(
                    "Ignoring unreadable cache metadata '{}': {e}",
                    meta_path.display()
                ));
                return Ok(None);
            }
        };

        if meta.body_sha256 != body_digest(&body) {
            logger::log_debug(&format!(
                "Cache body '{}' does not match its metadata, treating as miss",
                data_path.display()
            ));
            return Ok(None);
        }

        Ok(Some(CacheEntry {
            status: meta.status,
            headers: meta.headers,
            body: Bytes::from(body),
        }))
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let (meta_path, data_path) = self.entry_paths(key);
        if let Some(parent) = data_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let meta = serde_json::to_vec(&EntryMeta {
            status: entry.status,
            headers: entry.headers.clone(),
            body_sha256: body_digest(&entry.body),
        })?;

        write_atomic(&data_path, &entry.body).await?;
        write_atomic(&meta_path, &meta).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn body_digest(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}

async fn read_if_exists(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write to a uniquely named sibling, fsync, then rename over `path`
///
/// Concurrent writers of the same key each use their own temp file.
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!("{file_name}.tmp.{}", Uuid::new_v4()));

    let written = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, path).await
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    written
}
