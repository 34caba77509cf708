//! HTTP protocol layer module
//!
//! Range parsing, MIME detection and response builders shared by the local,
//! proxy and static handlers.

pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::{
    apply_cors_headers, build_404_response, build_405_response, build_416_response,
    build_502_response, build_options_response, build_relay_response, build_status_response,
    empty_body, full_body, ResponseBody, TileResponse,
};
