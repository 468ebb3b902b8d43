#![no_main]

use libfuzzer_sys::fuzz_target;
use shortlist_core::{normalize, years_mentioned};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let once = normalize(raw);
    assert_eq!(normalize(&once), once, "normalize must be idempotent");
    assert_eq!(once.trim(), once);

    let _ = years_mentioned(&once);
});
