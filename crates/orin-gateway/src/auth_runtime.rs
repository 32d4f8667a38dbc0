//! Signed session cookies backing the browser login.
//!
//! A session cookie carries `{expires}.{base64(email)}.{base64(signature)}`
//! where the signature is an HMAC-SHA256 over the first two segments. The
//! server keeps no session table; possession of a validly signed, unexpired
//! cookie is the whole session.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use orin_core::{current_unix_timestamp, is_expired_unix};

pub const SESSION_COOKIE_NAME: &str = "orin_session";

type HmacSha256 = Hmac<Sha256>;

/// Builds the signed cookie payload for `email`, valid until `expires_unix`.
pub fn session_cookie_payload(secret: &str, email: &str, expires_unix: u64) -> Option<String> {
    let encoded_email = URL_SAFE_NO_PAD.encode(email.as_bytes());
    let signed_portion = format!("{expires_unix}.{encoded_email}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(signed_portion.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Some(format!("{signed_portion}.{signature}"))
}

/// Renders the full `Set-Cookie` value for a session payload.
pub fn session_cookie(payload: &str, max_age_seconds: u64) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={payload}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age_seconds}"
    )
}

/// Renders the `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}

/// Returns the email inside a valid, unexpired session cookie value.
pub fn verify_session_cookie(cookie_value: &str, secret: &str, now_unix: u64) -> Option<String> {
    let mut segments = cookie_value.splitn(3, '.');
    let expires_raw = segments.next().unwrap_or_default();
    let email_segment = segments.next().unwrap_or_default();
    let signature_segment = segments.next().unwrap_or_default();
    if expires_raw.is_empty() || email_segment.is_empty() || signature_segment.is_empty() {
        return None;
    }

    let expires_unix = expires_raw.parse::<u64>().ok()?;
    if is_expired_unix(Some(expires_unix), now_unix) {
        return None;
    }

    let signature = URL_SAFE_NO_PAD.decode(signature_segment).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{expires_raw}.{email_segment}").as_bytes());
    mac.verify_slice(&signature).ok()?;

    let email_bytes = URL_SAFE_NO_PAD.decode(email_segment).ok()?;
    String::from_utf8(email_bytes).ok()
}

/// Resolves the signed-in identity from request headers, if any.
pub fn identity_from_headers(headers: &HeaderMap, secret: &str) -> Option<String> {
    let cookie_value = extract_cookie_value(headers, SESSION_COOKIE_NAME)?;
    verify_session_cookie(&cookie_value, secret, current_unix_timestamp())
}

fn extract_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let mut pieces = part.trim().splitn(2, '=');
        let key = pieces.next()?.trim();
        let value = pieces.next()?.trim();

        if key == cookie_name {
            return Some(value.to_string()).filter(|value| !value.is_empty());
        }
    }

    None
}
