//! Process tree snapshots.
//!
//! A [`Tree`] is built in one pass by [`TreeBuilder`] (enumerate, scan,
//! link) and is read-only afterwards. Invariants of a built tree:
//! - pid 0 is never a key;
//! - every process whose ppid is nonzero has that ppid as a key, and
//!   appears exactly once in the parent's children;
//! - every children list is sorted ascending with no duplicates, and only
//!   names processes whose ppid is the owner.

mod builder;
mod link;
mod walk;

pub use builder::{
    build_tree, build_with_retries, default_scan_threads, BuildOptions, TreeBuilder,
};
pub use walk::{Ancestors, BreadthFirst, DepthFirst};

use crate::collect::{ProcessRecord, ProcessStat};
use chrono::{DateTime, Utc};
use ps_common::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One process in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    record: ProcessRecord,
    children: Vec<ProcessId>,
}

impl Process {
    pub fn pid(&self) -> ProcessId {
        self.record.pid()
    }

    pub fn ppid(&self) -> ProcessId {
        self.record.ppid()
    }

    /// Command name from the stat record.
    pub fn name(&self) -> &str {
        &self.record.stat.comm
    }

    pub fn stat(&self) -> &ProcessStat {
        &self.record.stat
    }

    pub fn record(&self) -> &ProcessRecord {
        &self.record
    }

    /// Child pids, ascending.
    pub fn children(&self) -> &[ProcessId] {
        &self.children
    }
}

/// Facts about how a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// When the build started.
    pub taken_at: DateTime<Utc>,
    /// Wall time of the whole build.
    pub duration_ms: u64,
    /// Handles returned by enumeration.
    pub enumerated: usize,
    /// Listed processes that exited before they could be read.
    pub vanished: usize,
    /// Processes in the tree.
    pub process_count: usize,
}

/// A point-in-time process tree.
#[derive(Debug, Clone)]
pub struct Tree {
    procs: BTreeMap<ProcessId, Process>,
    metadata: SnapshotMetadata,
}

/// Trees compare by content; metadata is ignored.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.procs == other.procs
    }
}

impl Eq for Tree {}

impl Tree {
    pub(crate) fn from_parts(procs: Vec<Process>, metadata: SnapshotMetadata) -> Self {
        Tree {
            procs: procs.into_iter().map(|p| (p.pid(), p)).collect(),
            metadata,
        }
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn get(&self, pid: ProcessId) -> Option<&Process> {
        self.procs.get(&pid)
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.procs.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// All pids, ascending.
    pub fn pids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.procs.keys().copied()
    }

    /// All processes, ascending by pid.
    pub fn iter(&self) -> impl Iterator<Item = &Process> + '_ {
        self.procs.values()
    }

    /// Children of `pid`; empty if `pid` is unknown.
    pub fn children(&self, pid: ProcessId) -> &[ProcessId] {
        self.get(pid).map(Process::children).unwrap_or(&[])
    }

    /// Tracked parent of `pid`.
    pub fn parent(&self, pid: ProcessId) -> Option<&Process> {
        let ppid = self.get(pid)?.ppid();
        if ppid.is_none() {
            return None;
        }
        self.get(ppid)
    }

    /// Processes without a tracked parent (ppid 0), ascending.
    pub fn roots(&self) -> impl Iterator<Item = &Process> + '_ {
        self.iter().filter(|p| p.ppid().is_none())
    }

    /// Parent, grandparent, ... of `pid`, ending at a root.
    pub fn ancestors(&self, pid: ProcessId) -> Ancestors<'_> {
        Ancestors::new(self, pid)
    }

    /// Pre-order walk of the subtree at `pid` yielding `(depth, process)`.
    ///
    /// `pid` itself is yielded at depth 0; children are visited in
    /// ascending order. Empty if `pid` is unknown.
    pub fn walk_depth_first(&self, pid: ProcessId) -> DepthFirst<'_> {
        DepthFirst::new(self, pid)
    }

    /// Level-order walk of the subtree at `pid` yielding `(depth, process)`.
    pub fn walk_breadth_first(&self, pid: ProcessId) -> BreadthFirst<'_> {
        BreadthFirst::new(self, pid)
    }

    /// Number of processes in the subtree at `pid`, including `pid`.
    pub fn subtree_size(&self, pid: ProcessId) -> usize {
        self.walk_depth_first(pid).count()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a Process;
    type IntoIter = std::collections::btree_map::Values<'a, ProcessId, Process>;

    fn into_iter(self) -> Self::IntoIter {
        self.procs.values()
    }
}
