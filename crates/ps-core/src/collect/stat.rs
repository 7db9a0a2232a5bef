//! Parser for `/proc/[pid]/stat`.
//!
//! Format (see proc(5)):
//!
//! ```text
//! pid (comm) state ppid pgrp session tty_nr tpgid flags
//!     minflt cminflt majflt cmajflt utime stime cutime cstime
//!     priority nice num_threads itrealvalue starttime vsize rss ...
//! ```
//!
//! `comm` is the executable name wrapped in parentheses. It is chosen by
//! the process and may itself contain spaces and parentheses, so it is
//! taken as everything between the first `(` and the last `)` of the
//! record. The 22 fields after it are parsed positionally; the kernel emits
//! more, which are ignored.

use ps_common::{Error, ProcessId, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Number of positional fields following `(comm)` that must be present.
pub const STAT_FIELD_COUNT: usize = 22;

/// Fields parsed from one `/proc/[pid]/stat` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStat {
    /// Process ID.
    pub pid: ProcessId,
    /// Filename of the executable, without the wrapping parentheses.
    pub comm: String,
    /// Process state character (R, S, D, Z, T, ...).
    pub state: char,
    /// Parent process ID (0 for init and kthreadd).
    pub ppid: ProcessId,
    /// Process group ID.
    pub pgrp: i32,
    /// Session ID.
    pub session: i32,
    /// Controlling terminal (device number).
    pub tty_nr: i32,
    /// Foreground process group of the controlling terminal.
    pub tpgid: i32,
    /// Kernel flags word.
    pub flags: u32,
    /// Minor faults not requiring a page load.
    pub minflt: u64,
    /// Minor faults of waited-for children.
    pub cminflt: u64,
    /// Major faults requiring a page load.
    pub majflt: u64,
    /// Major faults of waited-for children.
    pub cmajflt: u64,
    /// User time in clock ticks.
    pub utime: u64,
    /// System time in clock ticks.
    pub stime: u64,
    /// Waited-for children's user time in clock ticks.
    pub cutime: i64,
    /// Waited-for children's system time in clock ticks.
    pub cstime: i64,
    /// Scheduling priority.
    pub priority: i64,
    /// Nice value.
    pub nice: i64,
    /// Number of threads.
    pub num_threads: i64,
    /// Jiffies before the next SIGALRM (always 0 since 2.6.17).
    pub itrealvalue: i64,
    /// Start time after boot in clock ticks.
    pub starttime: u64,
    /// Virtual memory size in bytes.
    pub vsize: u64,
    /// Resident set size in pages.
    pub rss: i64,
}

/// Why a stat record could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatParseError {
    #[error("missing '(' before command name")]
    MissingCommStart,

    #[error("missing ')' after command name")]
    MissingCommEnd,

    #[error("invalid pid format {0:?}")]
    InvalidPid(String),

    #[error("pid 0 is reserved")]
    ReservedPid,

    #[error("expected at least {expected} fields after command name, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    #[error("invalid {field} format {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Parse a stat record read from `path`.
///
/// Shape errors are reported as [`Error::MalformedRecord`] naming `path`.
pub fn parse_stat(data: &[u8], path: &Path) -> Result<ProcessStat> {
    parse_stat_content(data).map_err(|e| Error::MalformedRecord {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse stat content (for testing and fuzzing).
pub fn parse_stat_content(data: &[u8]) -> std::result::Result<ProcessStat, StatParseError> {
    let open = data
        .iter()
        .position(|&b| b == b'(')
        .ok_or(StatParseError::MissingCommStart)?;
    let close = data
        .iter()
        .rposition(|&b| b == b')')
        .filter(|&close| close > open)
        .ok_or(StatParseError::MissingCommEnd)?;

    let pid_str = String::from_utf8_lossy(&data[..open]);
    let pid_str = pid_str.trim();
    let pid: u32 = pid_str
        .parse()
        .map_err(|_| StatParseError::InvalidPid(pid_str.to_string()))?;
    if pid == 0 {
        return Err(StatParseError::ReservedPid);
    }

    let comm = String::from_utf8_lossy(&data[open + 1..close]).into_owned();

    let rest = std::str::from_utf8(&data[close + 1..]).map_err(|_| {
        StatParseError::InvalidField {
            field: "trailing fields",
            value: String::from_utf8_lossy(&data[close + 1..]).into_owned(),
        }
    })?;
    let fields: Vec<&str> = rest.split_ascii_whitespace().collect();
    if fields.len() < STAT_FIELD_COUNT {
        return Err(StatParseError::TooFewFields {
            expected: STAT_FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let mut state_chars = fields[0].chars();
    let state = match (state_chars.next(), state_chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(StatParseError::InvalidField {
                field: "state",
                value: fields[0].to_string(),
            })
        }
    };

    Ok(ProcessStat {
        pid: ProcessId(pid),
        comm,
        state,
        ppid: ProcessId(field(&fields, 1, "ppid")?),
        pgrp: field(&fields, 2, "pgrp")?,
        session: field(&fields, 3, "session")?,
        tty_nr: field(&fields, 4, "tty_nr")?,
        tpgid: field(&fields, 5, "tpgid")?,
        flags: field(&fields, 6, "flags")?,
        minflt: field(&fields, 7, "minflt")?,
        cminflt: field(&fields, 8, "cminflt")?,
        majflt: field(&fields, 9, "majflt")?,
        cmajflt: field(&fields, 10, "cmajflt")?,
        utime: field(&fields, 11, "utime")?,
        stime: field(&fields, 12, "stime")?,
        cutime: field(&fields, 13, "cutime")?,
        cstime: field(&fields, 14, "cstime")?,
        priority: field(&fields, 15, "priority")?,
        nice: field(&fields, 16, "nice")?,
        num_threads: field(&fields, 17, "num_threads")?,
        itrealvalue: field(&fields, 18, "itrealvalue")?,
        starttime: field(&fields, 19, "starttime")?,
        vsize: field(&fields, 20, "vsize")?,
        rss: field(&fields, 21, "rss")?,
    })
}

fn field<T: FromStr>(
    fields: &[&str],
    index: usize,
    name: &'static str,
) -> std::result::Result<T, StatParseError> {
    fields[index]
        .parse()
        .map_err(|_| StatParseError::InvalidField {
            field: name,
            value: fields[index].to_string(),
        })
}
