#![no_main]

use libfuzzer_sys::fuzz_target;
use shortlist_llm::features::{JobPosting, ResumeFeatures};
use shortlist_llm::parse::parse_json_object;

fuzz_target!(|data: &[u8]| {
    let Ok(reply) = std::str::from_utf8(data) else {
        return;
    };

    // Arbitrary replies must be rejected with an error, never a panic.
    let Ok(map) = parse_json_object("fuzz", reply) else {
        return;
    };
    if let Ok(features) = ResumeFeatures::from_json("fuzz", &map) {
        let text = features.to_text();
        assert!(text.starts_with("Name: "));
        let _ = serde_json::to_string(&features);
    }
    let _ = JobPosting::from_reply("fuzz", &map).map(|posting| posting.to_text());
});
