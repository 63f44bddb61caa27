//! Match evaluator
//!
//! Strictly boolean containment: the expected pattern must occur as one
//! contiguous run inside the received buffer. Received data is never assumed
//! to be valid UTF-8, so `string` patterns are compared at the byte level.

use memchr::memmem;

use crate::error::Result;
use super::payload::encode;

/// Does `received` contain the pattern described by `tag`/`pattern`?
///
/// Fails only when the pattern itself is invalid (unknown tag, bad hex).
pub fn matches(received: &[u8], tag: &str, pattern: &str) -> Result<bool> {
    let needle = encode(tag, pattern)?;
    Ok(contains(received, &needle))
}

/// Contiguous subsequence test. An empty needle is contained in everything.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    memmem::find(haystack, needle).is_some()
}
