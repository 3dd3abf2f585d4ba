//! Per-engine visited-node counters, enabled by the `instrument` feature.
//!
//! With the feature off, [`Counters`] methods compile away entirely — there
//! is no branch, no atomic, no cost.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide visited-node tallies, one per engine.
pub struct Counters {
    #[cfg(feature = "instrument")]
    balanced: AtomicU64,
    #[cfg(feature = "instrument")]
    splay: AtomicU64,
    #[cfg(feature = "instrument")]
    implicit: AtomicU64,
}

/// A single process-wide instance, analogous to a metrics registry.
pub static COUNTERS: Counters = Counters::new();

impl Counters {
    const fn new() -> Self {
        Self {
            #[cfg(feature = "instrument")]
            balanced: AtomicU64::new(0),
            #[cfg(feature = "instrument")]
            splay: AtomicU64::new(0),
            #[cfg(feature = "instrument")]
            implicit: AtomicU64::new(0),
        }
    }

    /// Nodes visited by the balanced (AVL) engine's `find_overlaps`.
    pub fn balanced_visited(&self) -> u64 {
        #[cfg(feature = "instrument")]
        {
            self.balanced.load(Ordering::Relaxed)
        }
        #[cfg(not(feature = "instrument"))]
        {
            0
        }
    }

    /// Nodes visited by the splay engine's `find_overlaps`.
    pub fn splay_visited(&self) -> u64 {
        #[cfg(feature = "instrument")]
        {
            self.splay.load(Ordering::Relaxed)
        }
        #[cfg(not(feature = "instrument"))]
        {
            0
        }
    }

    /// Positions visited by the implicit engine's overlap walk.
    pub fn implicit_visited(&self) -> u64 {
        #[cfg(feature = "instrument")]
        {
            self.implicit.load(Ordering::Relaxed)
        }
        #[cfg(not(feature = "instrument"))]
        {
            0
        }
    }

    #[inline]
    #[allow(unused_variables)]
    pub(crate) fn record_balanced(&self, n: u64) {
        #[cfg(feature = "instrument")]
        self.balanced.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    #[allow(unused_variables)]
    pub(crate) fn record_splay(&self, n: u64) {
        #[cfg(feature = "instrument")]
        self.splay.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    #[allow(unused_variables)]
    pub(crate) fn record_implicit(&self, n: u64) {
        #[cfg(feature = "instrument")]
        self.implicit.fetch_add(n, Ordering::Relaxed);
    }
}
