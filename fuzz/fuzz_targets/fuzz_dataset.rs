//! Fuzz target for catalog dataset decoding.
//!
//! Decoding and store construction must reject bad input with an error,
//! never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pi_core::dataset::Dataset;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(dataset) = Dataset::from_json(text) {
        let _ = dataset.into_store();
    }
});
