//! The augmented AVL-balanced engine (`spec.md` §4.2).
//!
//! Predictable worst-case depth (`2*ceil(log2(n+1))`), supports insertion
//! and deletion interleaved with queries. Multiple concurrent readers are
//! safe against a quiescent writer; this type provides no internal
//! synchronization, matching the spec's "callers coordinate externally".

mod iter;
mod node;

use crate::interval::Interval;
use crate::overlap::{overlaps, IntervalLike};
use node::{erase, insert, remove_min, size, Link, Node};
use std::cmp::Ordering;

pub use iter::Iter;

/// Outcome of a successful or duplicate [`AvlTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// `true` if a new node was created; `false` if an equal-keyed interval
    /// already existed and was left unchanged.
    pub inserted: bool,
    /// Count of stored intervals less than or equal to the inserted key,
    /// under `(start, end)` order.
    pub rank: usize,
}

/// An AVL-balanced augmented interval tree.
#[derive(Default)]
pub struct AvlTree<C, P> {
    root: Link<C, P>,
}

impl<C, P> AvlTree<C, P> {
    /// Constructs an empty tree.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Number of stored intervals.
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// In-order iteration, earliest-starting intervals first.
    pub fn iter(&self) -> Iter<'_, C, P> {
        Iter::new(&self.root)
    }
}

impl<C: Ord + Copy, P> AvlTree<C, P> {
    /// Inserts `interval`. If an equal `(start, end)` key already exists,
    /// the existing node is left unchanged.
    pub fn insert(&mut self, interval: Interval<C, P>) -> InsertOutcome {
        let start = interval.start;
        let end = interval.end;
        let (new_root, inserted) = insert(self.root.take(), interval);
        self.root = new_root;
        InsertOutcome {
            inserted,
            rank: self.rank_of(start, end),
        }
    }

    /// Exact-key lookup. Returns the matching interval and its rank.
    pub fn find(&self, start: C, end: C) -> Option<(&Interval<C, P>, usize)> {
        let mut cur = self.root.as_deref();
        let mut rank = 0usize;
        while let Some(n) = cur {
            match (start, end).cmp(&(n.interval.start, n.interval.end)) {
                Ordering::Less => cur = n.left.as_deref(),
                Ordering::Equal => {
                    rank += size(&n.left) + 1;
                    return Some((&n.interval, rank));
                }
                Ordering::Greater => {
                    rank += size(&n.left) + 1;
                    cur = n.right.as_deref();
                }
            }
        }
        None
    }

    fn rank_of(&self, start: C, end: C) -> usize {
        let mut cur = self.root.as_deref();
        let mut rank = 0usize;
        while let Some(n) = cur {
            match (start, end).cmp(&(n.interval.start, n.interval.end)) {
                Ordering::Less => cur = n.left.as_deref(),
                Ordering::Equal => {
                    rank += size(&n.left) + 1;
                    break;
                }
                Ordering::Greater => {
                    rank += size(&n.left) + 1;
                    cur = n.right.as_deref();
                }
            }
        }
        rank
    }

    /// Removes the node keyed `(start, end)`, if present.
    pub fn erase(&mut self, start: C, end: C) -> Option<Interval<C, P>> {
        let (new_root, removed) = erase(self.root.take(), start, end);
        self.root = new_root;
        removed
    }

    /// Removes and returns the minimum-keyed interval ("no key" erase
    /// semantics from `spec.md` §4.2).
    pub fn erase_min(&mut self) -> Option<Interval<C, P>> {
        let (new_root, removed) = remove_min(self.root.take());
        self.root = new_root;
        removed
    }

    /// The minimum-keyed stored interval, if any.
    pub fn find_min(&self) -> Option<&Interval<C, P>> {
        let mut cur = self.root.as_deref()?;
        while let Some(next) = cur.left.as_deref() {
            cur = next;
        }
        Some(&cur.interval)
    }

    /// Every stored interval overlapping `query`, in unspecified order.
    ///
    /// Iterative work-stack walk pre-seeded with the root: a subtree is
    /// discarded when its `max` can't reach the query, only the left child
    /// is visited when the query ends before this node starts, otherwise
    /// both children are visited and this node is tested directly.
    pub fn find_overlaps<Q>(&self, query: &Q) -> Vec<&Interval<C, P>>
    where
        Q: IntervalLike<C> + ?Sized,
    {
        let mut out = Vec::new();
        let mut stack: Vec<&Node<C, P>> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push(root);
        }

        #[cfg(feature = "instrument")]
        let mut visited = 0u64;

        while let Some(n) = stack.pop() {
            #[cfg(feature = "instrument")]
            {
                visited += 1;
            }

            if query.start() >= n.max {
                continue;
            }
            if query.end() <= n.interval.start {
                if let Some(l) = n.left.as_deref() {
                    stack.push(l);
                }
                continue;
            }
            if overlaps(&n.interval, query) {
                out.push(&n.interval);
            }
            if let Some(l) = n.left.as_deref() {
                stack.push(l);
            }
            if let Some(r) = n.right.as_deref() {
                stack.push(r);
            }
        }

        #[cfg(feature = "instrument")]
        crate::instrumentation::COUNTERS.record_balanced(visited);

        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval::Query;

    fn iv(start: i32, end: i32) -> Interval<i32, ()> {
        Interval::new(start, end, ())
    }

    #[test]
    fn insert_then_find_returns_inserted() {
        let mut tree = AvlTree::new();
        tree.insert(iv(0, 10));
        let (found, rank) = tree.find(0, 10).expect("should be found");
        assert_eq!((found.start, found.end), (0, 10));
        assert_eq!(rank, 1);
    }

    #[test]
    fn duplicate_insert_returns_existing() {
        let mut tree = AvlTree::new();
        let first = tree.insert(iv(100, 200));
        let second = tree.insert(iv(100, 200));
        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn insert_then_erase_then_find_is_absent() {
        let mut tree = AvlTree::new();
        tree.insert(iv(5, 10));
        assert!(tree.erase(5, 10).is_some());
        assert!(tree.find(5, 10).is_none());
    }

    #[test]
    fn scenario_overlap_query() {
        let mut tree = AvlTree::new();
        tree.insert(iv(0, 10));
        tree.insert(iv(10, 20));
        tree.insert(iv(25, 35));

        let mut hits: Vec<(i32, i32)> = tree
            .find_overlaps(&Query::new(15, 30))
            .into_iter()
            .map(|i| (i.start, i.end))
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![(10, 20), (25, 35)]);
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let mut tree = AvlTree::new();
        tree.insert(iv(0, 10));
        tree.insert(iv(10, 20));
        assert!(tree.find_overlaps(&Query::new(10, 10)).is_empty());
    }

    #[test]
    fn erase_and_inorder_scenario() {
        let mut tree = AvlTree::new();
        for start in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(iv(start, start + 1));
        }
        tree.erase(5, 6);

        let order: Vec<(i32, i32)> = tree.iter().map(|i| (i.start, i.end)).collect();
        assert_eq!(
            order,
            vec![(1, 2), (3, 4), (4, 5), (7, 8), (8, 9), (9, 10)]
        );
    }
}
