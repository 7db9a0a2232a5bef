//! Process collection.
//!
//! This module provides the read side of a snapshot:
//! - Listing and raw reads through the [`ProcessSource`] trait
//! - The procfs implementation ([`ProcFs`])
//! - `/proc/[pid]/stat` parsing
//! - Scanning one process into a [`ProcessRecord`]
//!
//! Nothing here links processes together; see [`crate::tree`].

mod scan;
mod source;
pub mod stat;
mod types;

pub use scan::{scan_process, ScanOutcome};
pub use source::{ProcFs, ProcessHandle, ProcessSource, DEFAULT_PROC_ROOT, STAT_FILE};
pub use stat::{parse_stat, parse_stat_content, ProcessStat, StatParseError, STAT_FIELD_COUNT};
pub use types::{AuxPolicy, AuxSelection, ProcessRecord, ScanOptions};
