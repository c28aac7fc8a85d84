//! Fuzz target for engine.json parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pi_config::{validate_config, EngineConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = serde_json::from_slice::<EngineConfig>(data) {
        let _ = validate_config(&cfg);
    }
});
