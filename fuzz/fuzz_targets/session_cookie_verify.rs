#![no_main]

use libfuzzer_sys::fuzz_target;
use orin_gateway::auth_runtime::verify_session_cookie;

const SECRET: &str = "fuzz-session-secret";
const NOW_UNIX: u64 = 1_700_000_000;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    if let Some(email) = verify_session_cookie(&raw, SECRET, NOW_UNIX) {
        assert!(!email.is_empty());
        let expires = raw
            .split('.')
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .expect("accepted cookie must carry a numeric expiry");
        assert!(expires > NOW_UNIX);
    }
});
