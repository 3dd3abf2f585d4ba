//! The augmented self-adjusting (splay) engine (`spec.md` §4.3).
//!
//! Every successful `find`, `insert`, and single-match `find_overlaps`
//! splays the accessed node to the root. Because every read can mutate
//! structure, this engine is **not** safe for shared concurrent reads even
//! when no insert/erase is in flight — callers need exclusive access for
//! any operation, not just writes.

mod arena;

use crate::interval::Interval;
use crate::overlap::{overlaps, IntervalLike};
use arena::{Arena, Slot};
use rand::Rng;
use std::cmp::Ordering;

pub use crate::balanced::InsertOutcome;

fn child_size<C, P>(arena: &Arena<C, P>, idx: Option<usize>) -> u32 {
    idx.map_or(0, |i| arena.get(i).size)
}

fn child_max<C: Copy, P>(arena: &Arena<C, P>, idx: Option<usize>) -> Option<C> {
    idx.map(|i| arena.get(i).max)
}

fn recompute<C: Ord + Copy, P>(arena: &mut Arena<C, P>, idx: usize) {
    let (left, right, end) = {
        let s = arena.get(idx);
        (s.left, s.right, s.interval.end)
    };
    let mut max = end;
    if let Some(m) = child_max(arena, left) {
        if m > max {
            max = m;
        }
    }
    if let Some(m) = child_max(arena, right) {
        if m > max {
            max = m;
        }
    }
    let size = 1 + child_size(arena, left) + child_size(arena, right);
    let s = arena.get_mut(idx);
    s.max = max;
    s.size = size;
}

/// Rotates `x` up over its parent. Handles both the left-child and
/// right-child case; used as-is for a zig, and twice in sequence (by
/// [`splay`]) to realize a zig-zig or zig-zag.
fn rotate<C: Ord + Copy, P>(arena: &mut Arena<C, P>, root: &mut Option<usize>, x: usize) {
    let p = arena.get(x).parent.expect("rotate requires a parent");
    let g = arena.get(p).parent;

    if arena.get(p).left == Some(x) {
        let b = arena.get(x).right;
        arena.get_mut(p).left = b;
        if let Some(b) = b {
            arena.get_mut(b).parent = Some(p);
        }
        arena.get_mut(x).right = Some(p);
    } else {
        let b = arena.get(x).left;
        arena.get_mut(p).right = b;
        if let Some(b) = b {
            arena.get_mut(b).parent = Some(p);
        }
        arena.get_mut(x).left = Some(p);
    }

    arena.get_mut(p).parent = Some(x);
    arena.get_mut(x).parent = g;

    match g {
        Some(g) => {
            if arena.get(g).left == Some(p) {
                arena.get_mut(g).left = Some(x);
            } else {
                arena.get_mut(g).right = Some(x);
            }
        }
        None => *root = Some(x),
    }

    // p is now a child of x: recompute it first, then x, so x's max/size
    // are derived from p's already-correct values.
    recompute(arena, p);
    recompute(arena, x);
}

/// Splays `x` to the root via zig / zig-zig / zig-zag primitives.
fn splay<C: Ord + Copy, P>(arena: &mut Arena<C, P>, root: &mut Option<usize>, x: usize) {
    loop {
        let p = match arena.get(x).parent {
            Some(p) => p,
            None => break,
        };
        match arena.get(p).parent {
            Some(g) => {
                let p_is_left = arena.get(g).left == Some(p);
                let x_is_left = arena.get(p).left == Some(x);
                if p_is_left == x_is_left {
                    // zig-zig: rotate the grandparent's edge first, then
                    // the parent's (now occupying the grandparent's slot).
                    rotate(arena, root, p);
                    rotate(arena, root, x);
                } else {
                    // zig-zag: promote x over p, then over g (in the
                    // opposite rotation direction, determined by which
                    // child x has become of g).
                    rotate(arena, root, x);
                    rotate(arena, root, x);
                }
            }
            None => rotate(arena, root, x), // zig
        }
    }
}

/// An augmented splay tree. Recently-accessed keys migrate toward the
/// root, which helps sequential or locality-heavy access patterns and
/// hurts adversarial random access.
pub struct SplayTree<C, P> {
    arena: Arena<C, P>,
    root: Option<usize>,
    /// Probability that a successful access actually splays. `1.0` (the
    /// default) always splays, matching the spec's baseline contract.
    rho: f64,
}

impl<C, P> Default for SplayTree<C, P> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            root: None,
            rho: 1.0,
        }
    }
}

impl<C, P> SplayTree<C, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree that splays with probability `rho` on each
    /// successful access, eliding it the rest of the time. The `max`
    /// invariant holds regardless of whether splay runs.
    pub fn with_rho(rho: f64) -> Self {
        assert!((0.0..=1.0).contains(&rho), "rho must be in (0, 1]");
        Self {
            arena: Arena::default(),
            root: None,
            rho,
        }
    }

    pub fn len(&self) -> usize {
        self.root.map_or(0, |r| self.arena.get(r).size)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl<C: Ord + Copy, P> SplayTree<C, P> {
    fn maybe_splay(&mut self, idx: usize, rng: &mut impl Rng) {
        if self.rho >= 1.0 || rng.gen::<f64>() < self.rho {
            splay(&mut self.arena, &mut self.root, idx);
        }
    }

    /// Inserts `interval`, splaying the new or existing node afterward
    /// (subject to the probabilistic splay knob).
    pub fn insert(&mut self, interval: Interval<C, P>) -> InsertOutcome {
        self.insert_with_rng(interval, &mut rand::thread_rng())
    }

    /// Same as [`Self::insert`], but draws the probabilistic-splay coin
    /// flip from the supplied RNG, for deterministic tests.
    pub fn insert_with_rng(&mut self, interval: Interval<C, P>, rng: &mut impl Rng) -> InsertOutcome {
        let start = interval.start;
        let end = interval.end;

        let idx = match self.root {
            None => {
                let idx = self.arena.alloc(Slot::leaf(interval));
                self.root = Some(idx);
                self.maybe_splay(idx, rng);
                return InsertOutcome { inserted: true, rank: 1 };
            }
            Some(mut cur) => loop {
                match interval.cmp(&self.arena.get(cur).interval) {
                    Ordering::Equal => break (cur, false),
                    Ordering::Less => match self.arena.get(cur).left {
                        Some(l) => cur = l,
                        None => {
                            let idx = self.arena.alloc(Slot::leaf(interval));
                            self.arena.get_mut(idx).parent = Some(cur);
                            self.arena.get_mut(cur).left = Some(idx);
                            recompute(&mut self.arena, cur);
                            break (idx, true);
                        }
                    },
                    Ordering::Greater => match self.arena.get(cur).right {
                        Some(r) => cur = r,
                        None => {
                            let idx = self.arena.alloc(Slot::leaf(interval));
                            self.arena.get_mut(idx).parent = Some(cur);
                            self.arena.get_mut(cur).right = Some(idx);
                            recompute(&mut self.arena, cur);
                            break (idx, true);
                        }
                    },
                }
            },
        };

        let (idx, inserted) = idx;
        self.maybe_splay(idx, rng);
        InsertOutcome {
            inserted,
            rank: self.rank_of(start, end),
        }
    }

    fn rank_of(&self, start: C, end: C) -> usize {
        let mut cur = self.root;
        let mut rank = 0usize;
        while let Some(i) = cur {
            let s = self.arena.get(i);
            match (start, end).cmp(&(s.interval.start, s.interval.end)) {
                Ordering::Less => cur = s.left,
                Ordering::Equal => {
                    rank += child_size(&self.arena, s.left) + 1;
                    break;
                }
                Ordering::Greater => {
                    rank += child_size(&self.arena, s.left) + 1;
                    cur = s.right;
                }
            }
        }
        rank
    }

    fn find_idx(&self, start: C, end: C) -> Option<usize> {
        let mut cur = self.root;
        while let Some(i) = cur {
            let s = self.arena.get(i);
            match (start, end).cmp(&(s.interval.start, s.interval.end)) {
                Ordering::Less => cur = s.left,
                Ordering::Equal => return Some(i),
                Ordering::Greater => cur = s.right,
            }
        }
        None
    }

    /// Exact-key lookup, splaying the match to the root on success.
    pub fn find(&mut self, start: C, end: C) -> Option<(&Interval<C, P>, usize)> {
        self.find_with_rng(start, end, &mut rand::thread_rng())
    }

    pub fn find_with_rng(&mut self, start: C, end: C, rng: &mut impl Rng) -> Option<(&Interval<C, P>, usize)> {
        let idx = self.find_idx(start, end)?;
        let rank = self.rank_of(start, end);
        self.maybe_splay(idx, rng);
        Some((&self.arena.get(idx).interval, rank))
    }

    fn replace_in_parent(&mut self, child: usize, replacement: Option<usize>, parent: Option<usize>) {
        match parent {
            None => {
                self.root = replacement;
                if let Some(r) = replacement {
                    self.arena.get_mut(r).parent = None;
                }
            }
            Some(p) => {
                if self.arena.get(p).left == Some(child) {
                    self.arena.get_mut(p).left = replacement;
                } else {
                    self.arena.get_mut(p).right = replacement;
                }
                if let Some(r) = replacement {
                    self.arena.get_mut(r).parent = Some(p);
                }
            }
        }
    }

    /// Removes the node keyed `(start, end)`, per the documented choice for
    /// the spec's open question: classical BST removal (successor
    /// substitution when both children exist), then splaying the removed
    /// node's former parent to the root.
    pub fn erase(&mut self, start: C, end: C) -> Option<Interval<C, P>> {
        let idx = self.find_idx(start, end)?;
        let parent = self.arena.get(idx).parent;
        let left = self.arena.get(idx).left;
        let right = self.arena.get(idx).right;

        match (left, right) {
            (None, None) => {
                self.replace_in_parent(idx, None, parent);
                let removed = self.arena.dealloc(idx);
                if let Some(p) = parent {
                    splay(&mut self.arena, &mut self.root, p);
                }
                Some(removed)
            }
            (Some(c), None) | (None, Some(c)) => {
                self.replace_in_parent(idx, Some(c), parent);
                let removed = self.arena.dealloc(idx);
                if let Some(p) = parent {
                    splay(&mut self.arena, &mut self.root, p);
                }
                Some(removed)
            }
            (Some(_), Some(r)) => {
                let mut succ = r;
                while let Some(l) = self.arena.get(succ).left {
                    succ = l;
                }
                let succ_parent = self.arena.get(succ).parent.unwrap();
                let succ_right = self.arena.get(succ).right;

                if succ_parent == idx {
                    self.arena.get_mut(idx).right = succ_right;
                    if let Some(sr) = succ_right {
                        self.arena.get_mut(sr).parent = Some(idx);
                    }
                } else {
                    self.arena.get_mut(succ_parent).left = succ_right;
                    if let Some(sr) = succ_right {
                        self.arena.get_mut(sr).parent = Some(succ_parent);
                    }
                }

                let succ_interval = self.arena.dealloc(succ);
                let removed = std::mem::replace(&mut self.arena.get_mut(idx).interval, succ_interval);
                recompute(&mut self.arena, idx);

                let to_splay = if succ_parent == idx { idx } else { succ_parent };
                splay(&mut self.arena, &mut self.root, to_splay);
                Some(removed)
            }
        }
    }

    /// The minimum-keyed stored interval, if any. Does not splay.
    pub fn find_min(&self) -> Option<&Interval<C, P>> {
        let mut cur = self.root?;
        while let Some(l) = self.arena.get(cur).left {
            cur = l;
        }
        Some(&self.arena.get(cur).interval)
    }

    /// Every stored interval overlapping `query`. If exactly one match is
    /// found it is splayed to the root; zero or many matches leave the
    /// tree untouched, per the spec's tie-breaking rule for wide queries.
    pub fn find_overlaps<Q>(&mut self, query: &Q) -> Vec<&Interval<C, P>>
    where
        Q: IntervalLike<C> + ?Sized,
    {
        let mut out_idx = Vec::new();
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push(root);
        }

        #[cfg(feature = "instrument")]
        let mut visited = 0u64;

        while let Some(i) = stack.pop() {
            #[cfg(feature = "instrument")]
            {
                visited += 1;
            }
            let s = self.arena.get(i);
            if query.start() >= s.max {
                continue;
            }
            if query.end() <= s.interval.start {
                if let Some(l) = s.left {
                    stack.push(l);
                }
                continue;
            }
            if overlaps(&s.interval, query) {
                out_idx.push(i);
            }
            if let Some(l) = s.left {
                stack.push(l);
            }
            if let Some(r) = s.right {
                stack.push(r);
            }
        }

        #[cfg(feature = "instrument")]
        crate::instrumentation::COUNTERS.record_splay(visited);

        if out_idx.len() == 1 {
            let idx = out_idx[0];
            let mut rng = rand::thread_rng();
            self.maybe_splay(idx, &mut rng);
        }

        out_idx.into_iter().map(move |i| &self.arena.get(i).interval).collect()
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
    fn duplicate_insert_keeps_single_node_at_root() {
        let mut tree = SplayTree::new();
        let first = tree.insert(iv(100, 200));
        let second = tree.insert(iv(100, 200));
        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root.map(|r| tree.arena.get(r).interval.start), Some(100));
    }

    #[test]
    fn find_splays_to_root() {
        let mut tree = SplayTree::new();
        tree.insert(iv(0, 1));
        tree.insert(iv(10, 11));
        tree.insert(iv(20, 21));
        tree.find(0, 1);
        assert_eq!(tree.root.map(|r| tree.arena.get(r).interval.start), Some(0));
    }

    #[test]
    fn insert_then_erase_then_find_is_absent() {
        let mut tree = SplayTree::new();
        tree.insert(iv(5, 10));
        assert!(tree.erase(5, 10).is_some());
        assert!(tree.find(5, 10).is_none());
    }

    #[test]
    fn overlap_query_matches_balanced_engine_scenario() {
        let mut tree = SplayTree::new();
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
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::interval::Query;
    use proptest::{collection::vec, test_runner::TestRunner};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn check_max(tree: &SplayTree<i32, ()>, idx: Option<usize>) -> i32 {
        match idx {
            None => i32::MIN,
            Some(i) => {
                let s = tree.arena.get(i);
                let expected = s
                    .interval
                    .end
                    .max(check_max(tree, s.left))
                    .max(check_max(tree, s.right));
                assert_eq!(s.max, expected);
                expected
            }
        }
    }

    #[test]
    fn find_overlaps_matches_brute_force() {
        const DOM: std::ops::Range<i32> = -200..200;
        const LEN: usize = 200;

        TestRunner::default()
            .run(
                &(vec(DOM, LEN), vec(0usize..40, LEN), DOM, DOM),
                |(starts, lens, qstart, qend)| {
                    let mut tree = SplayTree::with_rho(0.0);
                    let mut rng = StdRng::seed_from_u64(0);
                    let mut all = Vec::new();
                    for (&start, &len) in starts.iter().zip(&lens) {
                        let end = start + len as i32 + 1;
                        tree.insert_with_rng(Interval::new(start, end, ()), &mut rng);
                        all.push((start, end));
                    }

                    let mut fast: Vec<(i32, i32)> = tree
                        .find_overlaps(&Query::new(qstart, qend))
                        .into_iter()
                        .map(|i| (i.start, i.end))
                        .collect();
                    let mut slow: Vec<(i32, i32)> = all
                        .into_iter()
                        .filter(|&(s, e)| qstart < e && s < qend)
                        .collect();

                    fast.sort_unstable();
                    slow.sort_unstable();
                    slow.dedup();
                    assert_eq!(fast, slow);

                    check_max(&tree, tree.root);
                    Ok(())
                },
            )
            .unwrap();
    }

    #[test]
    fn repeated_find_is_idempotent_on_contents() {
        let mut tree = SplayTree::new();
        for start in 0..20 {
            tree.insert(Interval::new(start, start + 1, ()));
        }

        let before: Vec<(i32, i32)> = {
            let mut v: Vec<_> = (0..20)
                .filter_map(|s| tree.find_idx(s, s + 1).map(|_| (s, s + 1)))
                .collect();
            v.sort_unstable();
            v
        };

        for _ in 0..5 {
            tree.find(3, 4);
        }
        assert_eq!(tree.root.map(|r| tree.arena.get(r).interval.start), Some(3));

        let after: Vec<(i32, i32)> = {
            let mut v: Vec<_> = (0..20)
                .filter_map(|s| tree.find_idx(s, s + 1).map(|_| (s, s + 1)))
                .collect();
            v.sort_unstable();
            v
        };
        assert_eq!(before, after);
    }
}
