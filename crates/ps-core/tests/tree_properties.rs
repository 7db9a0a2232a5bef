//! Property-based tests for stat parsing and linking.

use proptest::prelude::*;
use ps_common::ProcessId;
use ps_core::collect::{parse_stat_content, StatParseError, STAT_FIELD_COUNT};
use ps_core::mock_process::{synthetic_stat_line, MockSource};
use ps_core::tree::{build_tree, BuildOptions};

/// Parent assignments where each pid's parent is 0 or a smaller pid.
fn forest(max: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..max).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| {
                let pid = i as u32 + 1;
                // index 0 means "root"
                let ppid = pick.index(pid as usize) as u32;
                (pid, ppid)
            })
            .collect()
    })
}

fn source_for(edges: &[(u32, u32)]) -> MockSource {
    edges
        .iter()
        .fold(MockSource::new(), |s, &(pid, ppid)| s.with_process(pid, ppid, "p"))
}

proptest! {
    #[test]
    fn name_with_any_parens_round_trips(name in "[a-z() ]{0,15}", pid in 1u32..4_000_000, ppid in 0u32..4_000_000) {
        let line = synthetic_stat_line(pid, &name, 'R', ppid);
        let stat = parse_stat_content(line.as_bytes()).unwrap();
        prop_assert_eq!(stat.comm, name);
        prop_assert_eq!(stat.pid, ProcessId(pid));
        prop_assert_eq!(stat.ppid, ProcessId(ppid));
        prop_assert_eq!(stat.state, 'R');
    }

    #[test]
    fn truncated_records_never_parse(cut in 0usize..STAT_FIELD_COUNT) {
        let line = synthetic_stat_line(7, "x", 'S', 1);
        let close = line.rfind(')').unwrap();
        let kept: Vec<&str> = line[close + 1..].split_whitespace().take(cut).collect();
        let truncated = format!("{} {}", &line[..=close], kept.join(" "));
        let err = parse_stat_content(truncated.as_bytes()).unwrap_err();
        let is_too_few = matches!(err, StatParseError::TooFewFields { .. });
        prop_assert!(is_too_few);
    }

    #[test]
    fn parser_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_stat_content(&data);
    }

    #[test]
    fn linked_forest_is_consistent(edges in forest(200), threads in 1usize..6) {
        let tree = build_tree(&source_for(&edges), &BuildOptions {
            scan: Default::default(),
            scan_threads: threads,
        }).unwrap();

        prop_assert_eq!(tree.len(), edges.len());
        let reachable: usize = tree.roots().map(|r| tree.subtree_size(r.pid())).sum();
        prop_assert_eq!(reachable, edges.len());

        for &(pid, ppid) in &edges {
            let pid = ProcessId(pid);
            let children = tree.children(pid);
            prop_assert!(children.windows(2).all(|w| w[0] < w[1]));
            if ppid != 0 {
                let count = tree.children(ProcessId(ppid)).iter().filter(|&&c| c == pid).count();
                prop_assert_eq!(count, 1);
                prop_assert_eq!(tree.parent(pid).map(|p| p.pid()), Some(ProcessId(ppid)));
            } else {
                prop_assert!(tree.parent(pid).is_none());
            }
        }
    }

    #[test]
    fn dropping_a_parent_reports_it(edges in forest(60)) {
        // Remove the parent of the last process that has one.
        let Some(&(_, parent)) = edges.iter().rev().find(|(_, ppid)| *ppid != 0) else {
            return Ok(());
        };
        let kept: Vec<(u32, u32)> = edges.iter().copied().filter(|&(pid, _)| pid != parent).collect();
        let err = build_tree(&source_for(&kept), &BuildOptions::default()).unwrap_err();
        match err {
            ps_common::Error::MissingParent { ppid, .. } => prop_assert_eq!(ppid, parent),
            other => prop_assert!(false, "unexpected error: {other:?}"),
        }
    }
}
