//! Log sanitization utilities
//!
//! Keeps credentials and bearer tokens out of debug/error logs and bounds the
//! size of logged response bodies (login pages are tens of kilobytes).

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Number of leading characters [`mask_secret`] leaves readable.
const MASK_VISIBLE_PREFIX: usize = 4;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Returns the original string if it's within the limit, otherwise the first
/// `TRUNCATE_LIMIT` bytes (on a char boundary) with the total length appended.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask a secret (password, token) for logging.
///
/// Short secrets are fully masked; longer ones keep a short prefix so two
/// tokens can still be told apart in a log.
pub fn mask_secret(secret: &str) -> String {
    let chars = secret.chars().count();
    if chars <= MASK_VISIBLE_PREFIX * 2 {
        "*".repeat(chars)
    } else {
        let prefix: String = secret.chars().take(MASK_VISIBLE_PREFIX).collect();
        format!("{prefix}*** [{chars} chars]")
    }
}
