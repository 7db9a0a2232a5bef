//! Snapshot pipeline: enumerate, scan, link.

use super::link::link;
use super::{SnapshotMetadata, Tree};
use crate::collect::{
    scan_process, ProcessHandle, ProcessRecord, ProcessSource, ScanOptions, ScanOutcome,
};
use chrono::Utc;
use ps_common::{Error, Result};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Options for one snapshot build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub scan: ScanOptions,
    /// Upper bound on concurrent scan workers. Must be at least 1.
    pub scan_threads: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            scan: ScanOptions::default(),
            scan_threads: default_scan_threads(),
        }
    }
}

/// Worker count used when none is configured.
pub fn default_scan_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Builds [`Tree`] snapshots from a [`ProcessSource`].
#[derive(Debug, Clone)]
pub struct TreeBuilder<S> {
    source: S,
    options: BuildOptions,
}

impl<S: ProcessSource> TreeBuilder<S> {
    pub fn new(source: S) -> Self {
        TreeBuilder {
            source,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take a snapshot. Each call re-reads the source.
    pub fn build(&self) -> Result<Tree> {
        build_tree(&self.source, &self.options)
    }

    /// Take a snapshot, rebuilding up to `retries` extra times on
    /// [`Error::MissingParent`].
    pub fn build_with_retries(&self, retries: u32) -> Result<Tree> {
        build_with_retries(&self.source, &self.options, retries)
    }
}

/// Take a snapshot of every process `source` lists.
///
/// Fails on the first scan or link error; no partial tree is returned.
/// Processes that exit between listing and reading are left out and
/// counted in [`SnapshotMetadata::vanished`].
pub fn build_tree<S>(source: &S, options: &BuildOptions) -> Result<Tree>
where
    S: ProcessSource + ?Sized,
{
    if options.scan_threads == 0 {
        return Err(Error::Config("scan_threads must be at least 1".to_string()));
    }

    let taken_at = Utc::now();
    let started = Instant::now();
    let _span = info_span!("build_tree", root = %source.root().display()).entered();

    let handles = {
        let _span = info_span!("enumerate").entered();
        source.list_processes().map_err(|e| Error::Enumeration {
            path: source.root().to_path_buf(),
            source: e,
        })?
    };
    let enumerated = handles.len();
    debug!(count = enumerated, "enumerated processes");

    let (records, vanished) = {
        let _span = info_span!("scan", threads = options.scan_threads).entered();
        scan_all(source, &handles, options)?
    };

    let procs = {
        let _span = info_span!("link").entered();
        link(records)?
    };

    let metadata = SnapshotMetadata {
        taken_at,
        duration_ms: started.elapsed().as_millis() as u64,
        enumerated,
        vanished,
        process_count: procs.len(),
    };
    info!(
        processes = metadata.process_count,
        vanished = metadata.vanished,
        duration_ms = metadata.duration_ms,
        "snapshot complete"
    );

    Ok(Tree::from_parts(procs, metadata))
}

/// Like [`build_tree`], but rebuilds while the failure is a parent that
/// exited mid-snapshot, at most `retries` times. Any other error, or the
/// last `MissingParent`, is returned as-is.
pub fn build_with_retries<S>(source: &S, options: &BuildOptions, retries: u32) -> Result<Tree>
where
    S: ProcessSource + ?Sized,
{
    let mut attempt = 0;
    loop {
        match build_tree(source, options) {
            Err(err @ Error::MissingParent { .. }) if attempt < retries => {
                attempt += 1;
                warn!(attempt, retries, error = %err, "snapshot inconsistent; retrying");
            }
            result => return result,
        }
    }
}

/// Scan every handle, splitting the work into at most `scan_threads`
/// contiguous chunks. Results come back in handle order.
fn scan_all<S>(
    source: &S,
    handles: &[ProcessHandle],
    options: &BuildOptions,
) -> Result<(Vec<ProcessRecord>, usize)>
where
    S: ProcessSource + ?Sized,
{
    if handles.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let chunk_size = handles.len().div_ceil(options.scan_threads);
    let scan = &options.scan;

    // Workers already started are joined by the scope even if a later
    // spawn fails.
    let outcomes: Result<Vec<Result<Vec<ScanOutcome>>>> = thread::scope(|s| {
        let mut workers = Vec::new();
        for (index, chunk) in handles.chunks(chunk_size).enumerate() {
            let worker = thread::Builder::new()
                .name(format!("scan-{index}"))
                .spawn_scoped(s, move || {
                    chunk
                        .iter()
                        .map(|handle| scan_process(source, handle, scan))
                        .collect::<Result<Vec<_>>>()
                })
                .map_err(|e| {
                    error!(worker = index, error = %e, "could not start scan worker");
                    Error::Internal(format!("could not start scan worker: {e}"))
                })?;
            workers.push(worker);
        }

        Ok(workers
            .into_iter()
            .map(|w| {
                w.join().unwrap_or_else(|_| {
                    error!("scan worker panicked");
                    Err(Error::Internal("scan worker panicked".to_string()))
                })
            })
            .collect())
    });

    let mut records = Vec::with_capacity(handles.len());
    let mut vanished = 0;
    for chunk in outcomes? {
        for outcome in chunk? {
            match outcome {
                ScanOutcome::Found(record) => records.push(record),
                ScanOutcome::Vanished => vanished += 1,
            }
        }
    }
    Ok((records, vanished))
}
