//! PMTiles edge server
//!
//! Serves PMTiles archives from a local data directory, or proxies them from
//! the daily build server through a restart-durable response cache. Both
//! paths honor single byte-range requests, and `latest.pmtiles` names the
//! newest archive available.

pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod origin;
pub mod server;

pub use error::{Result, TileError};
