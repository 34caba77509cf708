//! HTTP response building module
//!
//! Provides builders for the status codes the edge produces, plus the shared
//! boxed body type so streamed and buffered responses can flow through the
//! same router.

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// Body type shared by every response (buffered or streamed from disk)
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Response type shared by every handler
pub type TileResponse = Response<ResponseBody>;

/// Body of the 502 returned when `latest` cannot be resolved
pub const RESOLUTION_FAILED_BODY: &str = "Could not resolve latest build";

/// CORS headers attached to every response
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-headers", "Range"),
    (
        "access-control-expose-headers",
        "Content-Length, Content-Range, Accept-Ranges",
    ),
];

/// Wrap buffered bytes as a response body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty response body
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build 404 Not Found response
pub fn build_404_response() -> TileResponse {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(full_body("Not found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full_body("Not found"))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> TileResponse {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(full_body("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(full_body("405 Method Not Allowed"))
        })
}

/// Build 416 Range Not Satisfiable response (no body)
pub fn build_416_response(total: u64) -> TileResponse {
    Response::builder()
        .status(416)
        .header("Content-Range", format!("bytes */{total}"))
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty_body())
        })
}

/// Build 502 Bad Gateway response with an optional plain-text body
pub fn build_502_response(message: Option<&'static str>) -> TileResponse {
    let body = message.map_or_else(empty_body, full_body);
    let mut builder = Response::builder().status(502);
    if message.is_some() {
        builder = builder.header("Content-Type", "text/plain");
    }
    builder.body(body).unwrap_or_else(|e| {
        log_build_error("502", &e);
        Response::new(empty_body())
    })
}

/// Build OPTIONS response (CORS preflight)
pub fn build_options_response() -> TileResponse {
    build_status_response(200)
}

/// Build a bodiless response carrying only a status code
///
/// Unknown codes fall back to 502.
pub fn build_status_response(status: u16) -> TileResponse {
    Response::builder()
        .status(status)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            let mut resp = Response::new(empty_body());
            *resp.status_mut() = hyper::StatusCode::BAD_GATEWAY;
            resp
        })
}

/// Build a response from a stored or relayed (status, headers, body) triple
pub fn build_relay_response(status: u16, headers: &[(String, String)], body: Bytes) -> TileResponse {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(full_body(body)).unwrap_or_else(|e| {
        log_build_error(&status.to_string(), &e);
        build_status_response(502)
    })
}

/// Attach the CORS headers to an outgoing response
pub fn apply_cors_headers(response: &mut TileResponse) {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_bytes(resp: TileResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_416_has_content_range_and_no_body() {
        let resp = build_416_response(1000);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["content-range"], "bytes */1000");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_502_with_message() {
        let resp = build_502_response(Some(RESOLUTION_FAILED_BODY));
        assert_eq!(resp.status(), 502);
        assert_eq!(body_bytes(resp).await, RESOLUTION_FAILED_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_relay_keeps_header_order() {
        let headers = vec![
            ("Content-Type".to_string(), "application/octet-stream".to_string()),
            ("Content-Range".to_string(), "bytes 0-3/10".to_string()),
        ];
        let resp = build_relay_response(206, &headers, Bytes::from_static(b"abcd"));
        assert_eq!(resp.status(), 206);
        let names: Vec<_> = resp.headers().keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(names, vec!["content-type", "content-range"]);
        assert_eq!(body_bytes(resp).await, "abcd");
    }

    #[test]
    fn test_status_response_rejects_invalid_code() {
        assert_eq!(build_status_response(42).status(), 502);
    }

    #[test]
    fn test_cors_headers_applied() {
        let mut resp = build_404_response();
        apply_cors_headers(&mut resp);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.headers()["access-control-allow-headers"], "Range");
        assert_eq!(
            resp.headers()["access-control-expose-headers"],
            "Content-Length, Content-Range, Accept-Ranges"
        );
    }
}
