//! Logger module
//!
//! Provides logging utilities for the tile edge:
//! - Startup banner (tile mode, origin, cache location)
//! - Access logging with multiple formats
//! - Error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AppState, Config};
use crate::handler::TileMode;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    DEBUG_ENABLED.store(config.logging.debug, Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let config = &state.config;
    write_info("======================================");
    write_info(&format!("Serving {} on http://{addr}", config.static_files.root));
    match state.mode {
        TileMode::Local => {
            let alias = config.tiles.latest_alias_path();
            let target = std::fs::canonicalize(&alias).unwrap_or(alias);
            write_info(&format!(
                "Tile mode: local ({})",
                target.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned())
            ));
            write_info(&format!("Serving /tiles/* from {}", config.tiles.data_dir));
        }
        TileMode::Proxy => {
            if config.tiles.force_proxy {
                write_info("Tile mode: proxy");
            } else {
                write_info("Tile mode: proxy (no local tile found)");
            }
            write_info(&format!("Proxying /tiles/* -> {}", state.proxy.origin_base_url()));
            write_info(&format!("Disk cache: {}", state.proxy.cache_location()));
            if state.proxy.origin_insecure_tls() {
                write_info("Origin TLS verification: disabled");
            }
        }
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    if DEBUG_ENABLED.load(Ordering::Relaxed) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
