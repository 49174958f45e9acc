//! Phone number normalization.
//!
//! Players are identified by phone number, and clients send those in whatever
//! shape the user typed. Everything except digits is stripped, apart from a
//! `+` in first position, so `"+1 (555) 123-4567"` and `"+15551234567"`
//! address the same player.

/// Canonical form of a raw phone string. Total: empty input gives an empty
/// key, which callers must reject before touching the store.
pub fn normalize_phone(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '+' && out.is_empty()) {
            out.push(c);
        }
    }
    out
}
