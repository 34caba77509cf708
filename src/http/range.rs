//! HTTP Range request parsing module
//!
//! Single byte-range parsing for tile archive reads, a strict subset of RFC 7233.

/// A byte range resolved against a known total length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position (inclusive)
    pub start: u64,
    /// Last byte position (inclusive), already clamped to `total - 1`
    pub end: u64,
    /// Total resource length the range was resolved against
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a 206 response
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Range header parse result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseResult {
    /// No Range header, serve the whole resource with 200
    None,
    /// Valid single range, serve with 206
    Valid(ByteRange),
    /// Unparseable or unsatisfiable, serve 416 with `bytes */{total}`
    Malformed,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range, `end` clamped to the last byte
/// - `bytes=start-` - From start to end
///
/// The suffix form `bytes=-N`, multiple ranges and any other unit are
/// reported as [`RangeParseResult::Malformed`].
///
/// # Examples
/// ```
/// use pmtiles_edge::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=900-"), 1000);
/// assert!(matches!(result, RangeParseResult::Valid(r) if r.start == 900 && r.end == 999));
///
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, total: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::Malformed;
    };

    // Only support single range (not multi-range)
    if spec.contains(',') {
        return RangeParseResult::Malformed;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::Malformed;
    };

    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix ranges ("-500") are not served
    if start_str.is_empty() {
        return RangeParseResult::Malformed;
    }

    parse_standard_range(start_str, end_str, total)
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, total: u64) -> RangeParseResult {
    let Some(start) = parse_position(start_str) else {
        return RangeParseResult::Malformed;
    };

    // Also rejects every range on an empty resource
    if start >= total {
        return RangeParseResult::Malformed;
    }

    let last = total - 1;
    let end = if end_str.is_empty() {
        last
    } else {
        let Some(e) = parse_position(end_str) else {
            return RangeParseResult::Malformed;
        };
        e.min(last)
    };

    if end < start {
        return RangeParseResult::Malformed;
    }

    RangeParseResult::Valid(ByteRange { start, end, total })
}

/// Digits only: `u64::from_str` would also accept a leading `+`
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
