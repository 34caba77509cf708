//! Local tile archive serving
//!
//! Answers tile requests from files under the data directory with 200, 206,
//! 416 or 404. Bodies are streamed from disk in bounded chunks; ranged reads
//! seek to the start and take exactly the range length.

use crate::error::{Result, TileError};
use crate::handler::is_valid_resource_name;
use crate::http::{self, mime, RangeParseResult, TileResponse};
use crate::logger;
use crate::origin::LATEST_ALIAS;
use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::Response;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Read size for streamed archive bodies
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Serves tile archives from a local data directory
#[derive(Debug, Clone)]
pub struct LocalRangeServer {
    data_dir: PathBuf,
    /// Target of `latest.pmtiles`, usually a symlink to a dated archive
    latest_path: PathBuf,
}

impl LocalRangeServer {
    pub fn new(data_dir: impl AsRef<Path>, latest_path: PathBuf) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            latest_path,
        }
    }

    /// Serve `name` with optional byte-range support
    ///
    /// `is_head` produces the same status and headers without a body.
    pub async fn serve(&self, name: &str, range: Option<&str>, is_head: bool) -> TileResponse {
        self.try_serve(name, range, is_head)
            .await
            .unwrap_or_else(TileError::into_response)
    }

    async fn try_serve(&self, name: &str, range: Option<&str>, is_head: bool) -> Result<TileResponse> {
        let path = self.resolve_path(name).await?;

        let mut file = File::open(&path).await.map_err(|e| {
            logger::log_warning(&format!("Failed to open '{}': {e}", path.display()));
            TileError::NotFound(name.to_string())
        })?;
        let metadata = file.metadata().await.map_err(|e| {
            logger::log_warning(&format!("Failed to stat '{}': {e}", path.display()));
            TileError::NotFound(name.to_string())
        })?;
        if !metadata.is_file() {
            return Err(TileError::NotFound(name.to_string()));
        }
        let total = metadata.len();

        let (status, start, length, content_range) = match http::parse_range_header(range, total) {
            RangeParseResult::None => (200, 0, total, None),
            RangeParseResult::Valid(r) => (206, r.start, r.length(), Some(r.content_range())),
            RangeParseResult::Malformed => {
                logger::log_debug(&format!("Unsatisfiable range {range:?} for {name} ({total} bytes)"));
                return Err(TileError::Malformed { total });
            }
        };

        let body = if is_head {
            http::empty_body()
        } else {
            if start > 0 {
                file.seek(SeekFrom::Start(start)).await.map_err(|e| {
                    logger::log_error(&format!("Seek to {start} in '{}' failed: {e}", path.display()));
                    TileError::NotFound(name.to_string())
                })?;
            }
            let stream = ReaderStream::with_capacity(file.take(length), STREAM_CHUNK_SIZE);
            StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
        };

        let mut builder = Response::builder()
            .status(status)
            .header("Content-Type", mime::OCTET_STREAM)
            .header("Content-Length", length)
            .header("Accept-Ranges", "bytes");
        if let Some(content_range) = content_range {
            builder = builder.header("Content-Range", content_range);
        }

        builder.body(body).map_err(|e| {
            logger::log_error(&format!("Failed to build {status} response: {e}"));
            TileError::NotFound(name.to_string())
        })
    }

    /// Map a tile name to an existing file
    ///
    /// The alias may point anywhere; literal names must stay inside the data
    /// directory once symlinks are resolved.
    async fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        let not_found = || TileError::NotFound(name.to_string());

        if name == LATEST_ALIAS {
            return fs::canonicalize(&self.latest_path).await.map_err(|_| not_found());
        }
        if !is_valid_resource_name(name) {
            logger::log_warning(&format!("Rejected tile name: {name:?}"));
            return Err(not_found());
        }

        let data_dir = fs::canonicalize(&self.data_dir).await.map_err(|e| {
            logger::log_warning(&format!(
                "Data directory not found or inaccessible '{}': {e}",
                self.data_dir.display()
            ));
            not_found()
        })?;
        // Missing files are the common 404, not worth a warning
        let path = fs::canonicalize(self.data_dir.join(name))
            .await
            .map_err(|_| not_found())?;
        if !path.starts_with(&data_dir) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {name} -> {}",
                path.display()
            ));
            return Err(not_found());
        }
        Ok(path)
    }
}
