//! Tree builds over synthetic sources.

use ps_common::{AuxField, Error, ErrorCategory, ProcessId};
use ps_core::collect::{AuxPolicy, AuxSelection, ScanOptions};
use ps_core::mock_process::MockSource;
use ps_core::tree::{build_tree, BuildOptions, TreeBuilder};
use std::io;

fn options(threads: usize) -> BuildOptions {
    BuildOptions {
        scan: ScanOptions::default(),
        scan_threads: threads,
    }
}

#[test]
fn three_process_family() {
    let source = MockSource::new()
        .with_process(1, 0, "init")
        .with_process(2, 1, "a")
        .with_process(3, 1, "b");
    let tree = build_tree(&source, &options(1)).unwrap();

    assert_eq!(tree.children(ProcessId(1)), &[ProcessId(2), ProcessId(3)]);
    assert!(tree.children(ProcessId(2)).is_empty());
    assert!(tree.children(ProcessId(3)).is_empty());
    assert_eq!(tree.roots().map(|p| p.pid()).collect::<Vec<_>>(), vec![ProcessId(1)]);
}

#[test]
fn large_random_tree_is_consistent() {
    let source = MockSource::random_tree(42, 5_000);
    let tree = build_tree(&source, &options(8)).unwrap();

    assert_eq!(tree.len(), 5_000);
    assert_eq!(tree.subtree_size(ProcessId(1)), 5_000);

    for process in &tree {
        let pid = process.pid();
        let ppid = process.ppid();
        if ppid.is_some() {
            let siblings = tree.children(ppid);
            assert_eq!(siblings.iter().filter(|&&c| c == pid).count(), 1);
        }
        let children = process.children();
        assert!(children.windows(2).all(|w| w[0] < w[1]));
        for &child in children {
            assert_eq!(tree.get(child).unwrap().ppid(), pid);
        }
    }
}

#[test]
fn every_walk_visits_each_pid_once() {
    let source = MockSource::random_tree(3, 800);
    let tree = build_tree(&source, &options(4)).unwrap();

    let mut dfs: Vec<ProcessId> = tree.walk_depth_first(ProcessId(1)).map(|(_, p)| p.pid()).collect();
    let mut bfs: Vec<ProcessId> = tree
        .walk_breadth_first(ProcessId(1))
        .map(|(_, p)| p.pid())
        .collect();
    dfs.sort();
    bfs.sort();
    let all: Vec<ProcessId> = tree.pids().collect();
    assert_eq!(dfs, all);
    assert_eq!(bfs, all);
}

#[test]
fn ancestors_reach_init() {
    let source = MockSource::random_tree(11, 300);
    let tree = build_tree(&source, &options(2)).unwrap();

    for pid in tree.pids() {
        let last = tree.ancestors(pid).last().map(|p| p.pid());
        if pid == ProcessId(1) {
            assert_eq!(last, None);
        } else {
            assert_eq!(last, Some(ProcessId(1)));
        }
    }
}

#[test]
fn vanished_leaves_are_dropped_silently() {
    let source = MockSource::new()
        .with_process(1, 0, "init")
        .with_vanished(2)
        .with_process(3, 1, "c")
        .with_vanished(4);
    let tree = build_tree(&source, &options(3)).unwrap();

    assert_eq!(tree.pids().collect::<Vec<_>>(), vec![ProcessId(1), ProcessId(3)]);
    assert_eq!(tree.metadata().vanished, 2);
}

#[test]
fn missing_parent_is_recoverable_consistency_error() {
    let source = MockSource::new()
        .with_process(1, 0, "init")
        .with_process(10, 9, "orphan");
    let err = build_tree(&source, &options(1)).unwrap_err();

    assert!(matches!(err, Error::MissingParent { pid: 10, ppid: 9 }));
    assert_eq!(err.category(), ErrorCategory::Consistency);
    assert!(err.is_recoverable());
    assert_eq!(err.to_string(), "parent pid=9 of pid=10 does not exist");
}

#[test]
fn stat_read_failure_is_fatal() {
    let source = MockSource::new()
        .with_process(1, 0, "init")
        .with_stat_error(2, io::ErrorKind::Other);
    let err = build_tree(&source, &options(2)).unwrap_err();
    assert!(matches!(err, Error::PrimaryRead { .. }));
}

#[test]
fn aux_selection_limits_reads() {
    let source = MockSource::new()
        .with_process(1, 0, "init")
        .with_aux(1, AuxField::Cmdline, "init\0")
        .with_aux_error(1, AuxField::Environ, io::ErrorKind::Other);

    let opts = BuildOptions {
        scan: ScanOptions {
            aux_policy: AuxPolicy::Strict,
            aux_fields: AuxSelection {
                environ: false,
                cwd: true,
                cmdline: true,
            },
        },
        scan_threads: 1,
    };
    let tree = build_tree(&source, &opts).unwrap();
    assert_eq!(
        tree.get(ProcessId(1)).unwrap().record().cmdline_args(),
        vec!["init"]
    );
}

#[test]
fn builder_is_idempotent() {
    let builder = TreeBuilder::new(MockSource::random_tree(9, 1_000)).with_options(options(4));
    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.metadata().process_count, 1_000);
}
