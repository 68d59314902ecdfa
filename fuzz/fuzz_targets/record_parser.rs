#![no_main]

use adfps::normalize::{normalize, parse_record};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must surface as an error or a skip, never a panic
    if let Ok(raw) = parse_record(data) {
        if let Ok(record) = normalize(&raw) {
            assert!(record.fps.value() > 0.0);
            assert!(record.metrics.iter().all(|(_, v)| v.is_finite()));
        }
    }
});
