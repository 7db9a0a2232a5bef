//! Iterative traversals over a [`Tree`].
//!
//! Process chains can be arbitrarily deep, so walks keep their own
//! stack/queue instead of recursing. A pid is yielded at most once per
//! walk, which keeps a walk finite even if pid reuse during the scan
//! produced a parent cycle.

use super::{Process, Tree};
use ps_common::ProcessId;
use std::collections::{HashSet, VecDeque};

/// Pre-order depth-first walk. See [`Tree::walk_depth_first`].
pub struct DepthFirst<'a> {
    tree: &'a Tree,
    stack: Vec<(usize, ProcessId)>,
    seen: HashSet<ProcessId>,
}

impl<'a> DepthFirst<'a> {
    pub(super) fn new(tree: &'a Tree, pid: ProcessId) -> Self {
        let stack = if tree.contains(pid) {
            vec![(0, pid)]
        } else {
            Vec::new()
        };
        DepthFirst {
            tree,
            stack,
            seen: HashSet::new(),
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a Process);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, pid)) = self.stack.pop() {
            if !self.seen.insert(pid) {
                continue;
            }
            let Some(process) = self.tree.get(pid) else {
                continue;
            };
            // Reversed so the smallest child is popped first
            self.stack
                .extend(process.children().iter().rev().map(|&c| (depth + 1, c)));
            return Some((depth, process));
        }
        None
    }
}

/// Level-order walk. See [`Tree::walk_breadth_first`].
pub struct BreadthFirst<'a> {
    tree: &'a Tree,
    queue: VecDeque<(usize, ProcessId)>,
    seen: HashSet<ProcessId>,
}

impl<'a> BreadthFirst<'a> {
    pub(super) fn new(tree: &'a Tree, pid: ProcessId) -> Self {
        let mut queue = VecDeque::new();
        if tree.contains(pid) {
            queue.push_back((0, pid));
        }
        BreadthFirst {
            tree,
            queue,
            seen: HashSet::new(),
        }
    }
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = (usize, &'a Process);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, pid)) = self.queue.pop_front() {
            if !self.seen.insert(pid) {
                continue;
            }
            let Some(process) = self.tree.get(pid) else {
                continue;
            };
            self.queue
                .extend(process.children().iter().map(|&c| (depth + 1, c)));
            return Some((depth, process));
        }
        None
    }
}

/// Walk from a process up through its parents. See [`Tree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<ProcessId>,
    seen: HashSet<ProcessId>,
}

impl<'a> Ancestors<'a> {
    pub(super) fn new(tree: &'a Tree, pid: ProcessId) -> Self {
        let mut seen = HashSet::new();
        seen.insert(pid);
        Ancestors {
            tree,
            next: tree.get(pid).map(Process::ppid),
            seen,
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Process;

    fn next(&mut self) -> Option<Self::Item> {
        let pid = self.next.take()?;
        if pid.is_none() || !self.seen.insert(pid) {
            return None;
        }
        let process = self.tree.get(pid)?;
        self.next = Some(process.ppid());
        Some(process)
    }
}
