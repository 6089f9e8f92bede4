//! Fuzz target for learning configuration parsing.
//!
//! Arbitrary TOML or JSON input must parse to an error or a config whose
//! validation returns without panicking.

#![no_main]

use dbn_config::LearnConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = LearnConfig::from_toml_str(text) {
        let _ = config.validate();
    }
    if let Ok(config) = LearnConfig::from_json_str(text) {
        let _ = config.validate();
    }
});
