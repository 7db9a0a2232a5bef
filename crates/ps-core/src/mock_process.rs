//! Mock process source for testing.
//!
//! [`MockSource`] implements [`ProcessSource`] over an in-memory table of
//! synthetic records, so the builder can be exercised without a real
//! procfs. It supports:
//!
//! - Builder pattern for ergonomic test setup
//! - Processes that vanish between listing and reading
//! - Injected I/O failures for listing, stat and auxiliary reads
//! - Deterministic generation of large random trees via seed
//!
//! # Example
//!
//! ```ignore
//! use ps_core::mock_process::MockSource;
//!
//! let source = MockSource::new()
//!     .with_process(1, 0, "init")
//!     .with_process(2, 1, "sh")
//!     .with_vanished(3);
//! ```

use crate::collect::{ProcessHandle, ProcessSource};
use ps_common::AuxField;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

/// Root reported by mock sources.
pub const MOCK_ROOT: &str = "/mock/proc";

/// Build a well-formed stat line with the given identity.
///
/// Remaining fields get fixed plausible values; `pgrp` and `session` are
/// set to the pid.
pub fn synthetic_stat_line(pid: u32, name: &str, state: char, ppid: u32) -> String {
    format!(
        "{pid} ({name}) {state} {ppid} {pid} {pid} 0 -1 4194560 120 0 0 0 3 1 0 0 20 0 1 0 {start} 2252800 160 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0\n",
        start = 1000 + pid,
    )
}

// ============================================================================
// Deterministic RNG
// ============================================================================

/// Simple linear congruential generator for deterministic "random" values.
///
/// This is NOT cryptographically secure - it's only for generating
/// reproducible test data.
#[derive(Debug, Clone)]
pub struct MockRng {
    state: u64,
}

impl MockRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next pseudo-random u64.
    pub fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    /// Generate a pseudo-random value in [min, max].
    pub fn range(&mut self, min: u64, max: u64) -> u64 {
        min + (self.next_u64() % (max - min + 1))
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Debug, Clone)]
enum MockRead {
    Present(Vec<u8>),
    Absent,
    Fail(io::ErrorKind),
}

impl MockRead {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match self {
            MockRead::Present(bytes) => Ok(Some(bytes.clone())),
            MockRead::Absent => Ok(None),
            MockRead::Fail(kind) => Err(io::Error::new(*kind, "injected mock failure")),
        }
    }
}

#[derive(Debug, Clone)]
struct MockEntry {
    stat: MockRead,
    aux: HashMap<AuxField, MockRead>,
}

impl MockEntry {
    fn new(stat: MockRead) -> Self {
        MockEntry {
            stat,
            aux: HashMap::new(),
        }
    }
}

/// In-memory [`ProcessSource`].
///
/// Auxiliary fields that were never set read as absent.
#[derive(Debug, Clone)]
pub struct MockSource {
    root: PathBuf,
    entries: BTreeMap<u32, MockEntry>,
    list_error: Option<io::ErrorKind>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    pub fn new() -> Self {
        MockSource {
            root: PathBuf::from(MOCK_ROOT),
            entries: BTreeMap::new(),
            list_error: None,
        }
    }

    /// Add a sleeping process with a well-formed stat record.
    pub fn with_process(self, pid: u32, ppid: u32, name: &str) -> Self {
        self.with_raw_stat(pid, synthetic_stat_line(pid, name, 'S', ppid))
    }

    /// Add a process whose stat record is exactly `data`.
    pub fn with_raw_stat(mut self, pid: u32, data: impl Into<Vec<u8>>) -> Self {
        self.entries
            .insert(pid, MockEntry::new(MockRead::Present(data.into())));
        self
    }

    /// Add a listed process that is gone by the time it is read.
    pub fn with_vanished(mut self, pid: u32) -> Self {
        self.entries.insert(pid, MockEntry::new(MockRead::Absent));
        self
    }

    /// Add a listed process whose stat read fails.
    pub fn with_stat_error(mut self, pid: u32, kind: io::ErrorKind) -> Self {
        self.entries.insert(pid, MockEntry::new(MockRead::Fail(kind)));
        self
    }

    /// Set an auxiliary field of an already added process.
    pub fn with_aux(mut self, pid: u32, field: AuxField, data: impl Into<Vec<u8>>) -> Self {
        if let Some(entry) = self.entries.get_mut(&pid) {
            entry.aux.insert(field, MockRead::Present(data.into()));
        }
        self
    }

    /// Make an auxiliary field read of an already added process fail.
    pub fn with_aux_error(mut self, pid: u32, field: AuxField, kind: io::ErrorKind) -> Self {
        if let Some(entry) = self.entries.get_mut(&pid) {
            entry.aux.insert(field, MockRead::Fail(kind));
        }
        self
    }

    /// Make listing itself fail.
    pub fn with_list_error(mut self, kind: io::ErrorKind) -> Self {
        self.list_error = Some(kind);
        self
    }

    /// Generate `count` processes forming a random tree rooted at pid 1.
    ///
    /// Every process other than pid 1 gets a parent with a smaller pid, so
    /// the result always links.
    pub fn random_tree(seed: u64, count: u32) -> Self {
        let mut rng = MockRng::new(seed);
        let mut source = MockSource::new();
        for pid in 1..=count {
            let ppid = if pid == 1 {
                0
            } else {
                rng.range(1, u64::from(pid - 1)) as u32
            };
            source = source
                .with_process(pid, ppid, &format!("proc-{pid}"))
                .with_aux(pid, AuxField::Cmdline, format!("proc-{pid}\0--flag\0"));
        }
        source
    }

    /// Number of listed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, handle: &ProcessHandle) -> Option<&MockEntry> {
        self.entries.get(&handle.pid().0)
    }
}

impl ProcessSource for MockSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_processes(&self) -> io::Result<Vec<ProcessHandle>> {
        if let Some(kind) = self.list_error {
            return Err(io::Error::new(kind, "injected mock listing failure"));
        }
        Ok(self
            .entries
            .keys()
            .map(|&pid| ProcessHandle::new(pid, self.root.join(pid.to_string())))
            .collect())
    }

    fn read_primary_record(&self, handle: &ProcessHandle) -> io::Result<Option<Vec<u8>>> {
        match self.entry(handle) {
            Some(entry) => entry.stat.read(),
            None => Ok(None),
        }
    }

    fn read_aux_field(
        &self,
        handle: &ProcessHandle,
        field: AuxField,
    ) -> io::Result<Option<Vec<u8>>> {
        match self.entry(handle).and_then(|entry| entry.aux.get(&field)) {
            Some(read) => read.read(),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::stat::parse_stat_content;

    #[test]
    fn test_synthetic_stat_line_parses() {
        let line = synthetic_stat_line(42, "a (b) c", 'R', 7);
        let stat = parse_stat_content(line.as_bytes()).unwrap();
        assert_eq!(stat.pid.0, 42);
        assert_eq!(stat.comm, "a (b) c");
        assert_eq!(stat.state, 'R');
        assert_eq!(stat.ppid.0, 7);
        assert_eq!(stat.starttime, 1042);
    }

    #[test]
    fn test_mock_reads() {
        let source = MockSource::new()
            .with_process(1, 0, "init")
            .with_aux(1, AuxField::Cwd, "/")
            .with_vanished(2)
            .with_stat_error(3, io::ErrorKind::Other);

        let handles = source.list_processes().unwrap();
        assert_eq!(handles.len(), 3);

        assert!(source.read_primary_record(&handles[0]).unwrap().is_some());
        assert_eq!(
            source.read_aux_field(&handles[0], AuxField::Cwd).unwrap(),
            Some(b"/".to_vec())
        );
        assert_eq!(
            source.read_aux_field(&handles[0], AuxField::Environ).unwrap(),
            None
        );
        assert_eq!(source.read_primary_record(&handles[1]).unwrap(), None);
        assert!(source.read_primary_record(&handles[2]).is_err());
    }

    #[test]
    fn test_list_error() {
        let source = MockSource::new().with_list_error(io::ErrorKind::PermissionDenied);
        let err = source.list_processes().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_random_tree_is_deterministic() {
        let a = MockSource::random_tree(7, 50);
        let b = MockSource::random_tree(7, 50);
        assert_eq!(a.len(), 50);
        let handles = a.list_processes().unwrap();
        for handle in &handles {
            assert_eq!(
                a.read_primary_record(handle).unwrap(),
                b.read_primary_record(handle).unwrap()
            );
        }
    }
}
