//! pstree core library
//!
//! Point-in-time snapshots of the process tree read from procfs:
//! - Process enumeration and stat parsing (`collect`)
//! - Linking and read-only traversal (`tree`)
//! - Configuration loading and validation
//! - Structured logging setup
//! - Exit codes and rendering for the `procs-tree` CLI
//!
//! ```no_run
//! let tree = ps_core::snapshot()?;
//! for (depth, process) in tree.walk_depth_first(ps_common::ProcessId(1)) {
//!     println!("{}{}", "  ".repeat(depth), process.name());
//! }
//! # Ok::<(), ps_common::Error>(())
//! ```

pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod tree;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock_process;

pub use collect::{AuxPolicy, AuxSelection, ProcFs, ProcessRecord, ProcessSource, ScanOptions};
pub use tree::{
    build_tree, build_with_retries, BuildOptions, Process, SnapshotMetadata, Tree, TreeBuilder,
};

use std::path::Path;

/// Snapshot `/proc` with default options.
pub fn snapshot() -> ps_common::Result<Tree> {
    build_tree(&ProcFs::new(), &BuildOptions::default())
}

/// Snapshot a procfs-shaped directory tree rooted at `root`.
pub fn snapshot_at(root: impl AsRef<Path>, options: &BuildOptions) -> ps_common::Result<Tree> {
    build_tree(&ProcFs::with_root(root.as_ref()), options)
}
