//! The implicit array-backed engine (`spec.md` §4.4 / §4.3 of this crate's
//! expanded requirements).
//!
//! Intervals are grouped by contig (a byte-string name resolved through a
//! dictionary to a small integer id) and, per contig, laid out as an
//! implicit complete binary tree over a slice sorted by `start` — the
//! midpoint of a slice is that subtree's local root, the two halves either
//! side of it are its children. There is no explicit `left`/`right`
//! pointer: the structure is entirely positional, recomputed by [`index`]
//! and read by [`find_overlaps`](ImplicitTree::find_overlaps).
//!
//! Two phases: records accumulate via [`add`](ImplicitTree::add) in
//! insertion order (cheap append, `O(1)`), and become queryable only after
//! [`index`](ImplicitTree::index) sorts and re-packs them (`O(n log n)`,
//! batched rather than per-insert). Querying a dirty tree logs a warning
//! in debug builds and indexes implicitly rather than returning stale or
//! undefined results.

mod contig;
mod query;
mod record;

use crate::error::IntervalTreeError;
use contig::ContigTable;
use record::{pack_post, pack_pre, unpack_pre, Record};

/// An implicit, array-backed augmented interval tree, partitioned by
/// contig.
///
/// Handles returned by [`add`](ImplicitTree::add) are positions into the
/// internal records array. They are stable until the next call to
/// [`index`](ImplicitTree::index), which sorts the array; callers that
/// need a handle to outlive an `index` call should track `(contig, start,
/// end)` instead and re-resolve it.
#[derive(Default)]
pub struct ImplicitTree<P> {
    records: Vec<Record<P>>,
    contigs: ContigTable,
    dirty: bool,
}

impl<P> ImplicitTree<P> {
    /// Constructs an empty tree with no contigs registered.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            contigs: ContigTable::default(),
            dirty: false,
        }
    }

    /// Total stored interval count, across all contigs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` once a record has been added since the last [`index`] call.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Looks up a contig's assigned id, without registering it.
    pub fn contig_id(&self, name: impl AsRef<[u8]>) -> Option<u32> {
        self.contigs.id_of(name.as_ref())
    }

    /// Registers a contig up front, reserving capacity for `hint_len`
    /// additional records. Idempotent: an already-known name just returns
    /// its existing id and reserves nothing further.
    pub fn add_contig(
        &mut self,
        name: impl AsRef<[u8]>,
        hint_len: usize,
    ) -> Result<u32, IntervalTreeError> {
        let name = name.as_ref();
        if let Some(id) = self.contigs.id_of(name) {
            return Ok(id);
        }
        self.records.try_reserve(hint_len)?;
        Ok(self.contigs.ensure(name))
    }

    /// Appends an interval under `contig`, registering the contig if it is
    /// new. Returns a handle valid until the next [`index`] call.
    ///
    /// Does not validate `start <= end`: a malformed interval simply
    /// matches no query, consistent with the other two engines.
    pub fn add(&mut self, contig: impl AsRef<[u8]>, start: i32, end: i32, payload: P) -> usize {
        let contig_id = self.contigs.ensure(contig.as_ref());
        let idx = self.records.len();
        self.records.push(Record {
            packed: pack_pre(contig_id, start),
            max_end: end,
            flag: false,
            payload,
        });
        self.dirty = true;
        idx
    }

    /// Sorts records by `(contig_id, start)`, partitions them per contig,
    /// and recomputes each contig's subtree `max_end` values.
    ///
    /// Sorting compares the *decoded* `(contig_id, start)` tuple rather
    /// than the raw packed `u64`: a plain integer comparison of the packed
    /// pre-index field would sort negative starts after positive ones,
    /// since two's-complement negatives occupy the high half of the
    /// 32-bit range reserved for `start`.
    pub fn index(&mut self) {
        self.records
            .sort_by_key(|r| unpack_pre(r.packed));

        for c in &mut self.contigs.by_id {
            c.offset = 0;
            c.count = 0;
        }

        let mut i = 0;
        while i < self.records.len() {
            let (contig_id, _) = unpack_pre(self.records[i].packed);
            let start = i;
            while i < self.records.len() && unpack_pre(self.records[i].packed).0 == contig_id {
                i += 1;
            }
            let entry = &mut self.contigs.by_id[contig_id as usize];
            entry.offset = start as u32;
            entry.count = (i - start) as u32;
        }

        for c in &self.contigs.by_id {
            let slice =
                &mut self.records[c.offset as usize..(c.offset as usize + c.count as usize)];
            for r in slice.iter_mut() {
                let (_, start) = unpack_pre(r.packed);
                let end = r.max_end;
                r.packed = pack_post(start, end);
            }
            if !slice.is_empty() {
                query::update_max(slice);
            }
        }

        self.dirty = false;
    }

    /// The `(start, end, payload)` stored at a handle returned by [`add`]
    /// or [`find_overlaps`].
    pub fn record(&self, idx: usize) -> (i32, i32, &P) {
        let r = &self.records[idx];
        let (start, end) = if self.dirty {
            (unpack_pre(r.packed).1, r.max_end)
        } else {
            record::unpack_post(r.packed)
        };
        (start, end, &r.payload)
    }

    /// Indices of every record under `contig` overlapping `[start, end)`.
    ///
    /// Indexes implicitly if the tree is dirty (logging a warning in
    /// debug builds; the `add`-then-query-without-`index` sequence is a
    /// usage mistake worth surfacing, not a silent correctness trap). An
    /// unknown contig matches nothing.
    pub fn find_overlaps(&mut self, contig: impl AsRef<[u8]>, start: i32, end: i32) -> Vec<usize> {
        if self.dirty {
            if cfg!(debug_assertions) {
                log::warn!("find_overlaps called on a dirty implicit tree; indexing now");
            }
            self.index();
        }

        let Some(contig_id) = self.contigs.id_of(contig.as_ref()) else {
            return Vec::new();
        };
        let entry = &self.contigs.by_id[contig_id as usize];
        if entry.count == 0 {
            return Vec::new();
        }

        let offset = entry.offset as usize;
        let slice = &self.records[offset..offset + entry.count as usize];
        let mut out = query::Hits::new();
        let mut visited = 0u64;
        query::walk(slice, offset, start, end, &mut out, &mut visited);

        #[cfg(feature = "instrument")]
        crate::instrumentation::COUNTERS.record_implicit(visited);
        #[cfg(not(feature = "instrument"))]
        let _ = visited;

        out.into_vec()
    }

    /// Convenience wrapper over [`find_overlaps`](ImplicitTree::find_overlaps)
    /// that materializes the matching `(start, end, payload)` triples
    /// instead of raw indices.
    pub fn find_overlaps_records(
        &mut self,
        contig: impl AsRef<[u8]>,
        start: i32,
        end: i32,
    ) -> Vec<(i32, i32, &P)> {
        let idxs = self.find_overlaps(contig, start, end);
        idxs.into_iter().map(|idx| self.record(idx)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_then_index_then_find_overlaps_matches_scenario() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", 0, 10, "a");
        tree.add("chr1", 10, 20, "b");
        tree.add("chr1", 25, 35, "c");
        tree.index();

        let mut hits: Vec<&str> = tree
            .find_overlaps_records("chr1", 15, 30)
            .into_iter()
            .map(|(_, _, p)| *p)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!["b", "c"]);
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", 0, 10, ());
        tree.add("chr1", 10, 20, ());
        tree.index();
        assert!(tree.find_overlaps("chr1", 10, 10).is_empty());
        assert!(tree.find_overlaps("chr1", 20, 30).is_empty());
    }

    #[test]
    fn unknown_contig_matches_nothing() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", 0, 10, ());
        tree.index();
        assert!(tree.find_overlaps("chr2", 0, 10).is_empty());
    }

    #[test]
    fn separate_contigs_do_not_cross_contaminate() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", 0, 100, "chr1-hit");
        tree.add("chr2", 0, 100, "chr2-hit");
        tree.index();

        let hits: Vec<&str> = tree
            .find_overlaps_records("chr1", 0, 100)
            .into_iter()
            .map(|(_, _, p)| *p)
            .collect();
        assert_eq!(hits, vec!["chr1-hit"]);
    }

    #[test]
    fn negative_coordinates_sort_and_query_correctly() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", -50, -40, "neg");
        tree.add("chr1", -10, 5, "straddle");
        tree.add("chr1", 10, 20, "pos");
        tree.index();

        let mut hits: Vec<&str> = tree
            .find_overlaps_records("chr1", -20, 0)
            .into_iter()
            .map(|(_, _, p)| *p)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!["straddle"]);
    }

    #[test]
    fn querying_dirty_tree_auto_indexes() {
        let mut tree = ImplicitTree::new();
        tree.add("chr1", 0, 10, "a");
        assert!(tree.is_dirty());
        let hits = tree.find_overlaps("chr1", 0, 10);
        assert_eq!(hits.len(), 1);
        assert!(!tree.is_dirty());
    }

    #[test]
    fn add_contig_reserves_and_is_idempotent() {
        let mut tree: ImplicitTree<()> = ImplicitTree::new();
        let id1 = tree.add_contig("chr1", 1000).unwrap();
        let id2 = tree.add_contig("chr1", 1).unwrap();
        assert_eq!(id1, id2);
    }
}
