//! Primitive identity handles and the slot allocator that issues them.

use std::fmt;

/// A handle to a primitive in a [`Registry`](super::Registry).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a primitive is retired and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl PrimitiveId {
    /// Returns the raw slot index (for diagnostics only).
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveId({}@gen{})", self.idx, self.generation)
    }
}

/// Issues [`PrimitiveId`]s and recycles their slots once retired.
#[derive(Debug, Default)]
pub struct IdIssuer {
    generation: Vec<u32>,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl IdIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh handle, reusing a retired slot when one is available.
    pub fn issue(&mut self) -> PrimitiveId {
        if let Some(idx) = self.free_list.pop() {
            let slot = idx as usize;
            self.generation[slot] = self.generation[slot].wrapping_add(1);
            self.live[slot] = true;
            PrimitiveId {
                idx,
                generation: self.generation[slot],
            }
        } else {
            let idx = self.generation.len() as u32;
            self.generation.push(0);
            self.live.push(true);
            PrimitiveId { idx, generation: 0 }
        }
    }

    /// Returns true if `id` was issued and has not been retired since.
    pub fn is_live(&self, id: PrimitiveId) -> bool {
        let slot = id.idx as usize;
        slot < self.live.len() && self.live[slot] && self.generation[slot] == id.generation
    }

    /// Retires `id`, making its slot available for reuse.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn retire(&mut self, id: PrimitiveId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.live[id.idx as usize] = false;
        self.free_list.push(id.idx);
        true
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_ids_are_distinct() {
        let mut issuer = IdIssuer::new();
        let a = issuer.issue();
        let b = issuer.issue();
        assert_ne!(a, b);
        assert!(issuer.is_live(a));
        assert!(issuer.is_live(b));
        assert_eq!(issuer.live_count(), 2);
    }

    #[test]
    fn retired_slot_is_recycled_with_new_generation() {
        let mut issuer = IdIssuer::new();
        let a = issuer.issue();
        assert!(issuer.retire(a));
        assert!(!issuer.is_live(a));

        let b = issuer.issue();
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(issuer.is_live(b));
        assert!(!issuer.is_live(a));
    }

    #[test]
    fn double_retire_is_rejected() {
        let mut issuer = IdIssuer::new();
        let a = issuer.issue();
        assert!(issuer.retire(a));
        assert!(!issuer.retire(a));
        assert_eq!(issuer.live_count(), 0);
    }
}
