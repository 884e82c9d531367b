// Path: crates/state/src/components/accumulated_history.rs
//! ξ (xi): history of accumulated work-package hashes, per epoch slot
//! (spec §3.1, §4.5 "History update").

use jam_types::hash::Hash32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// ξ: `E` per-slot sets plus a global index equal to their union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccumulatedHistory {
    pub slots: VecDeque<BTreeSet<Hash32>>,
    pub global_index: BTreeSet<Hash32>,
}

impl AccumulatedHistory {
    pub fn new(epoch_length: u32) -> Self {
        Self {
            slots: std::iter::repeat_with(BTreeSet::new)
                .take(epoch_length as usize)
                .collect(),
            global_index: BTreeSet::new(),
        }
    }

    pub fn contains(&self, hash: &Hash32) -> bool {
        self.global_index.contains(hash)
    }

    /// Shifts ξ down one epoch slot: the oldest slot's entries are dropped
    /// from the global index, a fresh empty slot is appended, and `newly`
    /// is registered into both the newest slot and the global index
    /// (spec §4.5 "History update").
    pub fn shift_and_append(&mut self, newly: impl IntoIterator<Item = Hash32>) {
        if let Some(oldest) = self.slots.pop_front() {
            for h in &oldest {
                self.global_index.remove(h);
            }
        }
        let mut fresh = BTreeSet::new();
        for h in newly {
            fresh.insert(h);
            self.global_index.insert(h);
        }
        self.slots.push_back(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_and_append_drops_oldest_from_index() {
        let mut xi = AccumulatedHistory::new(2);
        xi.shift_and_append([Hash32([1; 32])]);
        xi.shift_and_append([Hash32([2; 32])]);
        assert!(xi.contains(&Hash32([1; 32])));
        assert!(xi.contains(&Hash32([2; 32])));
        // A third shift drops slot containing hash 1.
        xi.shift_and_append([Hash32([3; 32])]);
        assert!(!xi.contains(&Hash32([1; 32])));
        assert!(xi.contains(&Hash32([2; 32])));
        assert!(xi.contains(&Hash32([3; 32])));
    }
}
