//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, the
//! tile/static routing decision, CORS headers and access logging.

use crate::config::AppState;
use crate::http::{self, TileResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::{Method, Request, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Path prefix of tile archive requests
pub const TILE_PREFIX: &str = "/tiles/";

/// Where `/tiles/*` is served from, decided once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    Local,
    Proxy,
}

impl TileMode {
    /// Proxy when forced or when no local alias file exists
    pub const fn select(force_proxy: bool, local_alias_present: bool) -> Self {
        if force_proxy || !local_alias_present {
            Self::Proxy
        } else {
            Self::Local
        }
    }
}

/// Routing decision for a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Tile archive, carrying the resource name after the prefix
    Tile(&'a str),
    Static(&'a str),
}

impl<'a> Route<'a> {
    pub fn classify(path: &'a str) -> Self {
        path.strip_prefix(TILE_PREFIX)
            .map_or(Route::Static(path), Route::Tile)
    }
}

/// The parts of a request the handlers need, detached from its body
#[derive(Debug, Clone)]
struct RequestInfo {
    method: Method,
    path: String,
    query: Option<String>,
    version: Version,
    range: Option<String>,
    referer: Option<String>,
    user_agent: Option<String>,
}

impl RequestInfo {
    fn from_request<B>(req: &Request<B>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        // Non-ASCII range text must still reach the parser and fail there
        let range = req
            .headers()
            .get("range")
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            version: req.version(),
            range,
            referer: header("referer"),
            user_agent: header("user-agent"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<TileResponse, Infallible> {
    let started = Instant::now();
    let info = RequestInfo::from_request(&req);
    drop(req);

    let mut response = dispatch(&info, &state).await;
    if state.config.http.enable_cors {
        http::apply_cors_headers(&mut response);
    }

    if state.config.logging.access_log {
        log_request(info, &response, remote_addr, started, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch(info: &RequestInfo, state: &AppState) -> TileResponse {
    let is_head = info.method == Method::HEAD;

    match info.method {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", info.method));
            return http::build_405_response();
        }
    }

    let range = info.range.as_deref();

    match Route::classify(&info.path) {
        Route::Tile(name) => match state.mode {
            TileMode::Local => state.local.serve(name, range, is_head).await,
            TileMode::Proxy if is_head => state.proxy.head(name, range).await,
            TileMode::Proxy => state.proxy.forward(name, range).await,
        },
        Route::Static(path) => state.static_files.serve(path, is_head).await,
    }
}

fn log_request(
    info: RequestInfo,
    response: &TileResponse,
    remote_addr: Option<SocketAddr>,
    started: Instant,
    format: &str,
) {
    let mut entry = AccessLogEntry::new(
        remote_addr.map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
        info.method.to_string(),
        info.path,
    );
    entry.query = info.query;
    entry.http_version = match info.version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.range = info.range;
    entry.referer = info.referer;
    entry.user_agent = info.user_agent;
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::Config;
    use crate::origin::{LatestResolver, OriginClient};
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn state(mode: TileMode) -> (TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(data.join("a.pmtiles"), vec![7u8; 1000]).unwrap();
        std::fs::write(dir.path().join("index.html"), "viewer").unwrap();

        let mut config = Config::defaults().unwrap();
        config.tiles.data_dir = data.to_string_lossy().into_owned();
        config.static_files.root = dir.path().to_string_lossy().into_owned();
        config.origin.base_url = "http://127.0.0.1:9".to_string();
        config.logging.access_log = false;

        let origin = OriginClient::new(&config.origin).unwrap();
        let latest = LatestResolver::new(Arc::new(origin.clone()));
        let state = AppState::from_parts(config, mode, Arc::new(MemoryCache::new()), origin, latest);
        (dir, Arc::new(state))
    }

    fn request(method: Method, uri: &str, range: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(range) = range {
            builder = builder.header("Range", range);
        }
        builder.body(()).unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<()>) -> TileResponse {
        handle_request(req, Arc::clone(state), None).await.unwrap()
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(TileMode::select(false, true), TileMode::Local);
        assert_eq!(TileMode::select(true, true), TileMode::Proxy);
        assert_eq!(TileMode::select(false, false), TileMode::Proxy);
    }

    #[test]
    fn test_classify() {
        assert_eq!(Route::classify("/tiles/a.pmtiles"), Route::Tile("a.pmtiles"));
        assert_eq!(Route::classify("/tiles/"), Route::Tile(""));
        assert_eq!(Route::classify("/tiles"), Route::Static("/tiles"));
        assert_eq!(Route::classify("/index.html"), Route::Static("/index.html"));
    }

    #[tokio::test]
    async fn test_options_any_path() {
        let (_dir, state) = state(TileMode::Proxy);
        let resp = send(&state, request(Method::OPTIONS, "/tiles/anything", None)).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let (_dir, state) = state(TileMode::Local);
        let resp = send(&state, request(Method::POST, "/tiles/a.pmtiles", None)).await;
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
        assert_eq!(resp.headers()["access-control-allow-headers"], "Range");
    }

    #[tokio::test]
    async fn test_local_tiles_and_static() {
        let (_dir, state) = state(TileMode::Local);

        let resp = send(&state, request(Method::GET, "/tiles/a.pmtiles", Some("bytes=10-19"))).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["content-range"], "bytes 10-19/1000");
        assert_eq!(
            resp.headers()["access-control-expose-headers"],
            "Content-Length, Content-Range, Accept-Ranges"
        );

        let resp = send(&state, request(Method::GET, "/", None)).await;
        assert_eq!(resp.status(), 200);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "viewer");
    }

    #[tokio::test]
    async fn test_non_ascii_range_is_416() {
        let (_dir, state) = state(TileMode::Local);
        let mut req = request(Method::GET, "/tiles/a.pmtiles", None);
        req.headers_mut().insert(
            "range",
            hyper::header::HeaderValue::from_bytes(b"bytes=0-\xff9").unwrap(),
        );

        let resp = send(&state, req).await;
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["content-range"], "bytes */1000");
    }

    #[tokio::test]
    async fn test_proxy_mode_transport_failure_is_502() {
        let (_dir, state) = state(TileMode::Proxy);
        let resp = send(&state, request(Method::GET, "/tiles/a.pmtiles", None)).await;
        assert_eq!(resp.status(), 502);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_cors_can_be_disabled() {
        let (_dir, state) = state(TileMode::Local);
        let mut config = state.config.clone();
        config.http.enable_cors = false;
        let origin = OriginClient::new(&config.origin).unwrap();
        let latest = LatestResolver::new(Arc::new(origin.clone()));
        let state = Arc::new(AppState::from_parts(
            config,
            TileMode::Local,
            Arc::new(MemoryCache::new()),
            origin,
            latest,
        ));

        let resp = send(&state, request(Method::GET, "/tiles/a.pmtiles", None)).await;
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
