//! Shared plumbing for the Orin workspace: atomic file replacement for the
//! JSON document stores and Unix-time helpers for session expiry.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use time_utils::{current_unix_timestamp, is_expired_unix};
