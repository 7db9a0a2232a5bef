//! Fuzz target for /proc/[pid]/stat parsing.
//!
//! The parser sees raw kernel bytes, so input is not required to be UTF-8.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ps_core::collect::{parse_stat_content, STAT_FIELD_COUNT};

fuzz_target!(|data: &[u8]| {
    if let Ok(stat) = parse_stat_content(data) {
        // Anything accepted has a real pid and enough fields after the name
        assert!(stat.pid.is_some());
        let close = data.iter().rposition(|&b| b == b')').unwrap();
        let rest = String::from_utf8_lossy(&data[close + 1..]);
        assert!(rest.split_ascii_whitespace().count() >= STAT_FIELD_COUNT);
    }
});
