//! Slot occupancy bitmap

use vectis_hal::SlotId;

/// Largest slot pool the bitmap can track
pub const MAX_SLOTS: usize = 256;

/// Slot capacity of a manager built with `new` (the RA4M1 ICU has 32)
pub const DEFAULT_SLOTS: usize = 32;

const WORDS: usize = MAX_SLOTS / 32;

/// Occupancy bitmap over a pool of `len` slots
#[derive(Debug, Clone)]
pub struct SlotSet {
    words: [u32; WORDS],
    len: usize,
}

impl SlotSet {
    /// Create an empty set over `len` slots (clamped to [`MAX_SLOTS`])
    pub const fn new(len: usize) -> Self {
        Self {
            words: [0; WORDS],
            len: if len > MAX_SLOTS { MAX_SLOTS } else { len },
        }
    }

    /// Pool size
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the pool has no slots at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Check if every slot is occupied
    pub fn is_full(&self) -> bool {
        self.count() == self.len
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        let i = slot.index();
        i < self.len && self.words[i / 32] & (1 << (i % 32)) != 0
    }

    /// Mark a slot occupied; returns `false` if it already was
    pub fn insert(&mut self, slot: SlotId) -> bool {
        if slot.index() >= self.len || self.contains(slot) {
            return false;
        }
        let i = slot.index();
        self.words[i / 32] |= 1 << (i % 32);
        true
    }

    /// Mark a slot free; returns `false` if it already was
    pub fn remove(&mut self, slot: SlotId) -> bool {
        if !self.contains(slot) {
            return false;
        }
        let i = slot.index();
        self.words[i / 32] &= !(1 << (i % 32));
        true
    }

    /// Lowest free slot accepted by `legal`
    pub fn first_free(&self, mut legal: impl FnMut(SlotId) -> bool) -> Option<SlotId> {
        for (w, word) in self.words.iter().enumerate() {
            let base = w * 32;
            if base >= self.len {
                break;
            }

            let valid = self.len - base;
            let in_range = if valid >= 32 { u32::MAX } else { (1u32 << valid) - 1 };
            let mut free = !word & in_range;

            while free != 0 {
                let bit = free.trailing_zeros() as usize;
                let slot = SlotId((base + bit) as u8);
                if legal(slot) {
                    return Some(slot);
                }
                free &= free - 1;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = SlotSet::new(8);
        assert!(set.insert(SlotId(3)));
        assert!(!set.insert(SlotId(3)));
        assert!(set.contains(SlotId(3)));
        assert_eq!(set.count(), 1);

        assert!(set.remove(SlotId(3)));
        assert!(!set.remove(SlotId(3)));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut set = SlotSet::new(4);
        assert!(!set.insert(SlotId(4)));
        assert!(!set.contains(SlotId(4)));
    }

    #[test]
    fn test_first_free_lowest() {
        let mut set = SlotSet::new(40);
        for i in 0..33 {
            set.insert(SlotId(i));
        }
        set.remove(SlotId(5));

        assert_eq!(set.first_free(|_| true), Some(SlotId(5)));
        // Legality filter skips to the next word
        assert_eq!(set.first_free(|s| s.0 > 5), Some(SlotId(33)));
    }

    #[test]
    fn test_first_free_respects_len() {
        let mut set = SlotSet::new(3);
        for i in 0..3 {
            set.insert(SlotId(i));
        }
        assert!(set.is_full());
        assert_eq!(set.first_free(|_| true), None);
    }
}
