use crate::interval::Interval;

/// A slot of the splay engine's arena.
///
/// `parent` is a non-owning back-edge realized as an arena index (the
/// Design Notes' recommendation for a language without raw pointer freedom:
/// "arena + index, parent being another index or none"). Ownership still
/// flows root-to-leaf through `left`/`right`; `parent` is lookup-only.
pub(super) struct Slot<C, P> {
    pub(super) interval: Interval<C, P>,
    pub(super) max: C,
    pub(super) left: Option<usize>,
    pub(super) right: Option<usize>,
    pub(super) parent: Option<usize>,
    pub(super) size: u32,
}

impl<C: Copy, P> Slot<C, P> {
    pub(super) fn leaf(interval: Interval<C, P>) -> Self {
        let max = interval.end;
        Self {
            interval,
            max,
            left: None,
            right: None,
            parent: None,
            size: 1,
        }
    }
}

/// Indexed storage for splay-tree slots, with a free list so erased slots
/// are reused rather than leaking arena capacity (the same "indexed free
/// list" idea used elsewhere in this crate's ancestry, simplified here to
/// a safe `Option<Slot>` vector since the engine never needs the union
/// trick of storing a free-list pointer inside a live slot's bytes).
#[derive(Default)]
pub(super) struct Arena<C, P> {
    slots: Vec<Option<Slot<C, P>>>,
    free: Vec<usize>,
}

impl<C, P> Arena<C, P> {
    pub(super) fn alloc(&mut self, slot: Slot<C, P>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    pub(super) fn dealloc(&mut self, idx: usize) -> Interval<C, P> {
        let slot = self.slots[idx].take().expect("double free of splay slot");
        self.free.push(idx);
        slot.interval
    }

    pub(super) fn get(&self, idx: usize) -> &Slot<C, P> {
        self.slots[idx].as_ref().expect("dangling splay index")
    }

    pub(super) fn get_mut(&mut self, idx: usize) -> &mut Slot<C, P> {
        self.slots[idx].as_mut().expect("dangling splay index")
    }
}
