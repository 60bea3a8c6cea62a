//! Primary-key helpers.
//!
//! Pure functions with no store access, kept separate so the hash-prefix
//! transform is testable in isolation.

use base64::Engine;
use md5::{Digest, Md5};

const HASH_SEP: &str = "...";

/// 3 digest bytes always encode to 4 base64 characters, so the prefix has a
/// fixed width and can be stripped without re-hashing.
const HASH_PREFIX_LEN: usize = 4 + HASH_SEP.len();

/// Prepends `base64(md5(value)[0..3])` and a literal `...` to a key value,
/// spreading lexicographically-close keys across partitions while keeping the
/// stored form human-readable.
pub fn add_hash_prefix(value: &str) -> String {
    let digest = Md5::digest(value.as_bytes());
    let token = base64::engine::general_purpose::STANDARD.encode(&digest[..3]);
    format!("{token}{HASH_SEP}{value}")
}

/// Reverses [`add_hash_prefix`] by dropping the fixed-width prefix. A value
/// shorter than the prefix is returned unchanged.
pub fn strip_hash_prefix(value: &str) -> &str {
    value.get(HASH_PREFIX_LEN..).unwrap_or(value)
}
