//! Smoke tests against the live `/proc` of the test host.
#![cfg(target_os = "linux")]

use ps_common::{Error, ProcessId};
use ps_core::collect::{AuxPolicy, ProcFs, ScanOptions};
use ps_core::tree::{build_tree, BuildOptions, Tree};
use std::process::{Command, Stdio};

/// Snapshot, retrying while parents exit under the scan.
fn live_snapshot() -> Tree {
    let options = BuildOptions {
        scan: ScanOptions {
            aux_policy: AuxPolicy::Lenient,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut last_err = None;
    for _ in 0..10 {
        match build_tree(&ProcFs::new(), &options) {
            Ok(tree) => return tree,
            Err(err @ Error::MissingParent { .. }) => last_err = Some(err),
            Err(err) => panic!("live snapshot failed: {err}"),
        }
    }
    panic!("live snapshot kept racing: {last_err:?}");
}

#[test]
fn spawned_child_is_linked_to_us() {
    let mut child = Command::new("sleep")
        .arg("30")
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn sleep");
    let me = ProcessId(std::process::id());
    let kid = ProcessId(child.id());

    let tree = live_snapshot();
    let _ = child.kill();
    let _ = child.wait();

    assert!(tree.contains(me));
    assert!(tree.children(me).contains(&kid));
    assert_eq!(tree.parent(kid).map(|p| p.pid()), Some(me));
    assert_eq!(tree.get(kid).unwrap().name(), "sleep");
}

#[test]
fn own_record_has_aux_fields() {
    let tree = live_snapshot();
    let me = tree.get(ProcessId(std::process::id())).unwrap().record();

    let cwd = std::env::current_dir().unwrap();
    assert_eq!(me.cwd_path().as_deref(), Some(cwd.as_path()));
    assert!(!me.cmdline_args().is_empty());
}

#[test]
fn own_ancestry_ends_at_a_root() {
    let tree = live_snapshot();
    let me = ProcessId(std::process::id());
    let top = tree.ancestors(me).last().expect("test runner has a parent");
    assert!(top.ppid().is_none());
    assert!(tree.roots().any(|r| r.pid() == top.pid()));
}

#[test]
fn live_tree_is_consistent() {
    let tree = live_snapshot();
    assert!(!tree.is_empty());
    assert!(!tree.contains(ProcessId(0)));

    for process in &tree {
        let children = process.children();
        assert!(children.windows(2).all(|w| w[0] < w[1]));
        for &child in children {
            assert_eq!(tree.get(child).unwrap().ppid(), process.pid());
        }
    }
    let reachable: usize = tree.roots().map(|r| tree.subtree_size(r.pid())).sum();
    assert_eq!(reachable, tree.len());
}
