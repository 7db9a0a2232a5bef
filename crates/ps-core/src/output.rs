//! Rendering snapshots for the CLI.
//!
//! Text output is an indented tree; JSON output is a flat pid-keyed map in
//! which raw auxiliary bytes are base64-encoded, since `environ` and
//! `cmdline` are NUL-separated and not guaranteed to be UTF-8.

use crate::collect::ProcessStat;
use crate::tree::{Process, SnapshotMetadata, Tree};
use base64::Engine;
use ps_common::ProcessId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Pid shown when none is requested.
pub const DEFAULT_ROOT: ProcessId = ProcessId(1);

/// Pids to start rendering from.
///
/// An explicit pid must be in the tree. Without one, [`DEFAULT_ROOT`] is
/// used if present, otherwise every root.
pub fn select_roots(tree: &Tree, requested: Option<ProcessId>) -> Option<Vec<ProcessId>> {
    match requested {
        Some(pid) => tree.contains(pid).then(|| vec![pid]),
        None if tree.contains(DEFAULT_ROOT) => Some(vec![DEFAULT_ROOT]),
        None => Some(tree.roots().map(Process::pid).collect()),
    }
}

/// One-line summary of a process.
pub fn describe(process: &Process) -> String {
    let stat = process.stat();
    format!(
        "{} ({}) {} ppid={} threads={}",
        stat.pid, stat.comm, stat.state, stat.ppid, stat.num_threads
    )
}

/// Write each root and its descendants as an indented tree.
///
/// `max_depth` limits how far below each root to descend; `Some(1)` shows
/// direct children only.
pub fn write_text<W: Write>(
    out: &mut W,
    tree: &Tree,
    roots: &[ProcessId],
    max_depth: Option<usize>,
) -> io::Result<()> {
    for &root in roots {
        for (depth, process) in tree.walk_depth_first(root) {
            if max_depth.is_some_and(|max| depth > max) {
                continue;
            }
            if depth == 0 {
                writeln!(out, "tree[{}]: {}", root, describe(process))?;
            } else {
                writeln!(out, "{}{}", "  ".repeat(depth), describe(process))?;
            }
        }
    }
    Ok(())
}

/// JSON document for a snapshot.
#[derive(Debug, Serialize)]
pub struct TreeView<'a> {
    /// Requested root, if one was rendered.
    pub root: Option<ProcessId>,
    pub metadata: &'a SnapshotMetadata,
    pub procs: BTreeMap<ProcessId, ProcessView<'a>>,
}

/// JSON form of one process.
#[derive(Debug, Serialize)]
pub struct ProcessView<'a> {
    pub name: &'a str,
    pub stat: &'a ProcessStat,
    pub children: &'a [ProcessId],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Base64 of the raw NUL-separated bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmdline: Option<String>,
    /// Base64 of the raw NUL-separated bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environ: Option<String>,
}

impl<'a> ProcessView<'a> {
    pub fn new(process: &'a Process) -> Self {
        let record = process.record();
        let b64 = |bytes: &Option<Vec<u8>>| {
            bytes
                .as_deref()
                .map(|b| base64::engine::general_purpose::STANDARD.encode(b))
        };
        ProcessView {
            name: process.name(),
            stat: process.stat(),
            children: process.children(),
            cwd: record.cwd_path().map(|p| p.display().to_string()),
            cmdline: b64(&record.cmdline),
            environ: b64(&record.environ),
        }
    }
}

/// Build the JSON view of the processes reachable from `roots`, down to
/// `max_depth` below each root.
pub fn tree_view<'a>(
    tree: &'a Tree,
    root: Option<ProcessId>,
    roots: &[ProcessId],
    max_depth: Option<usize>,
) -> TreeView<'a> {
    let procs = roots
        .iter()
        .flat_map(|&r| tree.walk_depth_first(r))
        .filter(|(depth, _)| max_depth.map_or(true, |max| *depth <= max))
        .map(|(_, p)| (p.pid(), ProcessView::new(p)))
        .collect();
    TreeView {
        root,
        metadata: tree.metadata(),
        procs,
    }
}

/// Pretty-print the JSON view followed by a newline.
pub fn write_json<W: Write>(out: &mut W, view: &TreeView<'_>) -> ps_common::Result<()> {
    serde_json::to_writer_pretty(&mut *out, view)?;
    writeln!(out)?;
    Ok(())
}
