//! Minimal `Set-Cookie` handling
//!
//! The portal keys its session on a single cookie. This codec pulls that cookie
//! out of raw header text so it can be carried explicitly in a
//! [`SessionContext`](crate::models::SessionContext) instead of a cookie jar.

use std::collections::HashMap;

/// Name of the portal's session cookie
pub const SESSION_COOKIE: &str = "_yatri_session";

/// Parse a raw cookie header into name/value pairs
///
/// Splits on `;`, trims each part and splits it on the first `=`. Parts without
/// `=` (such as `HttpOnly`) map to an empty value. No quoting or escaping is
/// understood; when a name repeats, the first occurrence wins.
pub fn parse(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for part in raw.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (name, value) = match part.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (part, ""),
        };

        if !name.is_empty() {
            cookies
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    cookies
}

/// Extract the session cookie as a `name=value` string ready for a `Cookie` header
///
/// Returns `None` if the cookie is absent or has an empty value.
///
/// # Examples
///
/// ```
/// use slotwatch::portal::cookie::extract_session_cookie;
///
/// assert_eq!(
///     extract_session_cookie("_yatri_session=abc123; path=/; HttpOnly"),
///     Some("_yatri_session=abc123".to_string())
/// );
/// ```
pub fn extract_session_cookie(raw: &str) -> Option<String> {
    parse(raw)
        .remove(SESSION_COOKIE)
        .filter(|value| !value.is_empty())
        .map(|value| format!("{SESSION_COOKIE}={value}"))
}
