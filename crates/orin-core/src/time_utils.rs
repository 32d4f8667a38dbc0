use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, zero if the clock sits before it.
pub fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// True when `expires_unix` names a second that has already passed.
/// `None` means "never expires".
pub fn is_expired_unix(expires_unix: Option<u64>, now_unix: u64) -> bool {
    match expires_unix {
        Some(expires) => expires <= now_unix,
        None => false,
    }
}
