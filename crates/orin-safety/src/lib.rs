//! Inbound message screening against a fixed denylist.
//!
//! Matching is substring-based and ASCII case-insensitive, so a banned term
//! hits even when embedded inside a longer word. Screened messages are
//! answered with [`REFUSAL_MESSAGE`] and never reach the model.

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};

/// Terms that cause a message to be refused outright.
pub const BANNED_TERMS: [&str; 7] = [
    "kill",
    "bomb",
    "terrorist",
    "hack",
    "rape",
    "weapon",
    "suicide",
];

/// Canned reply returned verbatim for refused messages.
pub const REFUSAL_MESSAGE: &str = "⚠️ I can’t help with harmful or illegal requests.";

#[derive(Debug, Clone)]
/// Public struct `SafetyFilter` used across Orin components.
pub struct SafetyFilter {
    matcher: AhoCorasick,
}

impl SafetyFilter {
    pub fn new() -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(BANNED_TERMS)
            .context("failed to build banned-term matcher")?;
        Ok(Self { matcher })
    }

    /// Returns true when `text` contains any banned term.
    pub fn is_denied(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Returns the refusal reply for denied text, `None` for clean text.
    pub fn screen(&self, text: &str) -> Option<&'static str> {
        if self.is_denied(text) {
            Some(REFUSAL_MESSAGE)
        } else {
            None
        }
    }
}
