//! Process identity type.
//!
//! A process is identified by its kernel pid for the lifetime of one
//! snapshot. Pid 0 is reserved: it is never a key of a tree and, as a
//! parent id, marks a process with no tracked parent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// The "no tracked parent" id.
    pub const NONE: ProcessId = ProcessId(0);

    /// Whether this id refers to a real process (nonzero).
    pub fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Whether this is the reserved "no parent" id.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32 {
    fn from(pid: ProcessId) -> Self {
        pid.0
    }
}

impl std::str::FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(ProcessId)
    }
}
