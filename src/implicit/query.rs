use super::record::{unpack_post, Record};
use smallvec::SmallVec;

/// Inline buffer for a `find_overlaps` result: most queries against a
/// contig match a handful of records, so the common case never touches
/// the allocator.
pub(crate) type Hits = SmallVec<[usize; 8]>;

/// Recomputes `max_end` bottom-up over an already post-index-packed slice,
/// treating the slice's midpoint as the implicit tree's local root and
/// recursing into the two halves either side of it.
///
/// This is the same split-at-midpoint recursion `adamreichold/sif-itree`
/// uses to build its implicit tree over a sorted slice, adapted to this
/// crate's separate `max_end` field in place of its packed node layout.
/// Recursion depth is `ceil(log2(len))`, bounded by `usize::BITS` for any
/// slice that fits in memory.
pub(crate) fn update_max<P>(nodes: &mut [Record<P>]) -> i32 {
    let mid = nodes.len() / 2;
    let (left, rest) = nodes.split_at_mut(mid);
    let (node, right) = rest.split_first_mut().expect("non-empty slice");

    let (_, own_end) = unpack_post(node.packed);
    let mut max = own_end;
    if !left.is_empty() {
        max = max.max(update_max(left));
    }
    if !right.is_empty() {
        max = max.max(update_max(right));
    }
    node.max_end = max;
    max
}

/// Walks the implicit tree rooted at the midpoint of `nodes`, appending
/// the absolute index (`offset` + local position) of every record
/// overlapping `[q_start, q_end)` to `out`.
///
/// Mirrors `sif-itree`'s `query`: descend only into children whose
/// `max_end` could still reach the query, recursing for the side not
/// taken by the tail-loop when both must be visited. `*visited` counts
/// midpoints examined, for the `instrument` feature's counters.
pub(crate) fn walk<P>(
    mut nodes: &[Record<P>],
    mut offset: usize,
    q_start: i32,
    q_end: i32,
    out: &mut Hits,
    visited: &mut u64,
) {
    loop {
        if nodes.is_empty() {
            return;
        }
        *visited += 1;

        let mid = nodes.len() / 2;
        let (left, rest) = nodes.split_at(mid);
        let (node, right) = rest.split_first().expect("non-empty slice");
        let mid_abs = offset + mid;

        if q_start >= node.max_end {
            return;
        }

        let (node_start, node_end) = unpack_post(node.packed);

        if q_end <= node_start {
            // Sorted by start: every record to the right also starts at or
            // after `node_start`, so only the left subtree can still overlap.
            if left.is_empty() {
                return;
            }
            nodes = left;
            continue;
        }

        if q_start < node_end {
            out.push(mid_abs);
        }

        match (left.is_empty(), right.is_empty()) {
            (false, false) => {
                walk(left, offset, q_start, q_end, out, visited);
                nodes = right;
                offset = mid_abs + 1;
            }
            (false, true) => nodes = left,
            (true, false) => {
                nodes = right;
                offset = mid_abs + 1;
            }
            (true, true) => return,
        }
    }
}
