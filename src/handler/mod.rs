//! Request handler module
//!
//! Responsible for request routing dispatch and the three serving paths:
//! local tile archives, the caching origin proxy, and static viewer assets.

pub mod local;
pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, TileMode};

/// Whether a tile resource name is safe to join under a directory or key
///
/// Rejects empty names, path separators and parent references.
pub fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}
