//! Static file serving module
//!
//! Serves the viewer's assets (HTML, JS, styles, sprites) from the static
//! root, with index file lookup and path traversal protection.

use crate::http::{self, mime, TileResponse};
use crate::logger;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_files: Vec<String>,
}

impl StaticFiles {
    pub fn new(root: impl AsRef<Path>, index_files: Vec<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_files,
        }
    }

    /// Serve the file at request `path`, or 404
    pub async fn serve(&self, path: &str, is_head: bool) -> TileResponse {
        match self.load(path).await {
            Some((content, content_type)) => build_file_response(content, content_type, is_head),
            None => http::build_404_response(),
        }
    }

    /// Load a file beneath the root, trying index files for directories
    pub async fn load(&self, path: &str) -> Option<(Vec<u8>, &'static str)> {
        let relative_path = path.trim_start_matches('/');
        let mut file_path = self.root.join(relative_path);

        // Security: ensure file_path is within the root
        let root_canonical = match fs::canonicalize(&self.root).await {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Static directory not found or inaccessible '{}': {e}",
                    self.root.display()
                ));
                return None;
            }
        };

        if relative_path.is_empty() || relative_path.ends_with('/') || is_dir(&file_path).await {
            for index in &self.index_files {
                let candidate = file_path.join(index);
                if is_file(&candidate).await {
                    file_path = candidate;
                    break;
                }
            }
        }

        // File not found is common (404), no need to log at warning level
        let file_path_canonical = fs::canonicalize(&file_path).await.ok()?;
        if !file_path_canonical.starts_with(&root_canonical) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {path} -> {}",
                file_path_canonical.display()
            ));
            return None;
        }
        if !is_file(&file_path_canonical).await {
            return None;
        }

        let content = match fs::read(&file_path_canonical).await {
            Ok(c) => c,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    file_path_canonical.display()
                ));
                return None;
            }
        };

        let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
        Some((content, content_type))
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

fn build_file_response(content: Vec<u8>, content_type: &str, is_head: bool) -> TileResponse {
    let length = content.len();
    let body = if is_head {
        http::empty_body()
    } else {
        http::full_body(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", length)
        .body(body)
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build static file response: {e}"));
            http::build_404_response()
        })
}
