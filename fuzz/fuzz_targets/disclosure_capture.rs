#![no_main]

use libfuzzer_sys::fuzz_target;
use orin_memory::{detect_intent, extract_disclosures};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let disclosures = extract_disclosures(&text);
    if let Some(name) = &disclosures.name {
        assert_eq!(name.as_str(), name.trim());
    }
    if let Some(location) = &disclosures.location {
        assert_eq!(location.as_str(), location.trim());
    }

    let _ = detect_intent(&text);
});
