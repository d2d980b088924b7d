//! Pure helper functions for authentication

use axum::http::HeaderMap;

// =============================================================================
// Cookie Extraction
// =============================================================================

/// Extract a cookie value from headers
///
/// Handles multiple Cookie headers (some proxies fold/duplicate headers).
/// Uses `get_all` to collect all Cookie header values.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);

    for header_value in headers.get_all("cookie") {
        if let Ok(cookie_str) = header_value.to_str() {
            if let Some(value) = cookie_str
                .split(';')
                .map(|c| c.trim())
                .find(|c| c.starts_with(&prefix))
                .and_then(|c| c.strip_prefix(&prefix))
            {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// `Set-Cookie` value that expires `name` on `path`
pub fn clear_cookie(name: &str, path: &str, domain_attr: &str) -> String {
    format!(
        "{}=; HttpOnly; Secure; Path={}; Max-Age=0; SameSite=Lax{}",
        name, path, domain_attr
    )
}

// =============================================================================
// Tests
// =============================================================================
