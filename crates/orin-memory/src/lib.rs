//! Long-term user memory: phrase-triggered fact capture and recall.
//!
//! Disclosure parsing is deliberately literal. Triggers are matched on the
//! lowercased message, captures are cut after the last occurrence of the
//! trigger token in the original text and trimmed, nothing more.

pub mod disclosures;
pub mod profile_updater;

pub use disclosures::{
    detect_intent, extract_disclosures, Disclosures, UserIntent, PROFILE_ATTR_LOCATION,
    PROFILE_ATTR_NAME,
};
pub use profile_updater::ProfileUpdater;
