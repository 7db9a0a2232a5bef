//! Fuzz target for config.toml parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ps_core::config::TreeConfig;

fuzz_target!(|data: &str| {
    if let Ok(config) = toml::from_str::<TreeConfig>(data) {
        if config.validate().is_ok() {
            assert!(config.build_options().scan_threads >= 1);
        }
    }
});
