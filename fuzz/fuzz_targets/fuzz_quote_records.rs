//! Fuzz target for extracted quote records (JSON array or JSON lines).

#![no_main]

use libfuzzer_sys::fuzz_target;
use pi_core::ingest::parse_records;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_records(text);
    }
});
