//! Store key derivation for visit records.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Prefix shared by every visit record key.
pub const RECORD_PREFIX: &str = "visits";

/// Everything outside `[A-Za-z0-9._-]` is escaped in the origin segment.
const ORIGIN_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

/// Key of the record for `origin` in `period`: `visits/<encoded-origin>/<period>.json`.
pub fn record_key(origin: &str, period: &str) -> String {
    format!("{}/{}/{}.json", RECORD_PREFIX, encode_origin(origin), period)
}

/// Escapes the origin into a single path segment; distinct origins never collide.
pub fn encode_origin(origin: &str) -> String {
    utf8_percent_encode(origin, ORIGIN_SEGMENT).to_string()
}
