use rand::RngCore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Session cookie lifetime, matching the server-side session expiry.
pub const COOKIE_MAX_AGE_SECS: i64 = 4 * 60 * 60;

pub fn cookie(name: &str, value: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly; Max-Age={COOKIE_MAX_AGE_SECS}; Path=/; SameSite=Lax{secure}")
}

/// A fresh API access token: 20 lowercase hex characters.
pub fn access_token() -> String {
    let mut bytes = [0u8; 10];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Turns a free-text search into a `LIKE` pattern: runs of spaces become `%`.
pub fn like_pattern(search: &str) -> String {
    let joined = search.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("%");
    format!("%{joined}%")
}

/// Sets (or replaces) the `pageno` query parameter of a relative or absolute URL.
pub fn with_pageno(url: &str, pageno: i64) -> String {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("pageno="))
        .collect();
    let pageno = format!("pageno={pageno}");
    pairs.push(&pageno);
    format!("{path}?{}", pairs.join("&"))
}

pub fn total_pages(count: i64, per_page: i64) -> i64 {
    (count + per_page - 1) / per_page
}
