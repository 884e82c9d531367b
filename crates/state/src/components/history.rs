// Path: crates/state/src/components/history.rs
//! β: recent-history MMR and block digests (spec §3.1, §4.1 step 2).

use jam_types::hash::Hash32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single peak of the merkle-mountain-range, tagged with its height so
/// equal-height peaks can be merged on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MmrPeak {
    pub height: u32,
    pub hash: Hash32,
}

/// The merkle-mountain-range accumulating one digest per block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Mmr {
    pub peaks: Vec<MmrPeak>,
}

impl Mmr {
    /// Appends `leaf`, merging adjacent equal-height peaks (standard MMR
    /// append). `hasher` combines two child hashes into their parent.
    pub fn append(&mut self, leaf: Hash32, hasher: impl Fn(&Hash32, &Hash32) -> Hash32) {
        let mut carry = MmrPeak {
            height: 0,
            hash: leaf,
        };
        loop {
            let top_matches = matches!(self.peaks.last(), Some(top) if top.height == carry.height);
            match top_matches {
                true => {
                    // Safe: `top_matches` only true when `last()` is `Some`.
                    let top = self
                        .peaks
                        .pop()
                        .unwrap_or(MmrPeak { height: carry.height, hash: Hash32::ZERO });
                    let merged = hasher(&top.hash, &carry.hash);
                    carry = MmrPeak {
                        height: carry.height + 1,
                        hash: merged,
                    };
                }
                false => {
                    self.peaks.push(carry);
                    break;
                }
            }
        }
    }

    /// A single digest summarizing all peaks, used as β's contribution to
    /// the state dictionary.
    pub fn super_peak(&self, hasher: impl Fn(&[u8]) -> Hash32) -> Hash32 {
        if self.peaks.is_empty() {
            return Hash32::ZERO;
        }
        let mut buf = Vec::with_capacity(self.peaks.len() * 32);
        for p in &self.peaks {
            buf.extend_from_slice(p.hash.as_bytes());
        }
        hasher(&buf)
    }
}

/// A single recent-history entry: the block it was produced from, plus the
/// MMR state immediately after appending that block's digest.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct BlockInfo {
    pub header_hash: Hash32,
    pub state_root: Hash32,
    pub mmr: Mmr,
    /// Hashes of work-report package specs guaranteed in this block,
    /// kept so guarantees validation can reject duplicates (spec §4.3
    /// rule 8: "none already exists in recent β").
    pub reported_packages: Vec<Hash32>,
    /// The slot this block was produced at, kept so a `lookup_anchor`'s
    /// age can be checked against `max_lookup_anchor_age` (spec §4.3
    /// rule 4) rather than just its presence in the window.
    pub slot: u32,
}

/// β: a bounded-length (≤ H) rolling window of recent blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RecentHistory {
    pub entries: VecDeque<BlockInfo>,
}

impl RecentHistory {
    pub fn push(&mut self, entry: BlockInfo, max_len: usize) {
        self.entries.push_back(entry);
        while self.entries.len() > max_len {
            self.entries.pop_front();
        }
    }

    /// Whether `anchor` names a block still present in recent history
    /// (spec §4.3 rule 4: "context anchor exists in β").
    pub fn contains_anchor(&self, anchor: &Hash32) -> bool {
        self.entries.iter().any(|e| &e.header_hash == anchor)
    }

    /// The slot of the entry named by `anchor`, if it is present.
    pub fn slot_of(&self, anchor: &Hash32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| &e.header_hash == anchor)
            .map(|e| e.slot)
    }

    /// Whether `package_hash` already appears among recently-reported
    /// packages (spec §4.3 rule 8).
    pub fn contains_package(&self, package_hash: &Hash32) -> bool {
        self.entries
            .iter()
            .any(|e| e.reported_packages.iter().any(|p| p == package_hash))
    }

    pub fn within_bound(&self, max_len: usize) -> bool {
        self.entries.len() <= max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_hash(a: &Hash32, b: &Hash32) -> Hash32 {
        let mut out = [0u8; 32];
        for i in 0..32 {
            out[i] = a.as_bytes()[i] ^ b.as_bytes()[i];
        }
        Hash32(out)
    }

    #[test]
    fn mmr_merges_equal_height_peaks() {
        let mut mmr = Mmr::default();
        mmr.append(Hash32([1; 32]), xor_hash);
        mmr.append(Hash32([2; 32]), xor_hash);
        // two height-0 leaves merge into one height-1 peak
        assert_eq!(mmr.peaks.len(), 1);
        assert_eq!(mmr.peaks[0].height, 1);
    }

    #[test]
    fn recent_history_evicts_beyond_bound() {
        let mut hist = RecentHistory::default();
        for i in 0..5u8 {
            hist.push(
                BlockInfo {
                    header_hash: Hash32([i; 32]),
                    state_root: Hash32::ZERO,
                    mmr: Mmr::default(),
                    reported_packages: vec![],
                    slot: i as u32,
                },
                3,
            );
        }
        assert_eq!(hist.entries.len(), 3);
        assert!(hist.within_bound(3));
    }
}
