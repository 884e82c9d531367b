// Path: crates/state/src/components/entropy.rs
//! η: the four rotating entropy accumulators (spec §3.1, §4.2).

use jam_types::hash::Hash32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// `η₀..η₃`. `η₀` accumulates fresh entropy every block; at an epoch
/// boundary the three accumulators shift down and `η₀` restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Entropy {
    pub eta0: Hash32,
    pub eta1: Hash32,
    pub eta2: Hash32,
    pub eta3: Hash32,
}

impl Entropy {
    pub fn zero() -> Self {
        Self {
            eta0: Hash32::ZERO,
            eta1: Hash32::ZERO,
            eta2: Hash32::ZERO,
            eta3: Hash32::ZERO,
        }
    }

    /// Per-block update: `η₀ ← H(η₀ ‖ entropy_source)`. Rotation of
    /// `η₁..η₃` only happens at an epoch boundary (see `rotate_epoch`).
    pub fn accumulate(&mut self, entropy_source: &[u8], hasher: impl Fn(&[u8]) -> Hash32) {
        let mut buf = Vec::with_capacity(32 + entropy_source.len());
        buf.extend_from_slice(self.eta0.as_bytes());
        buf.extend_from_slice(entropy_source);
        self.eta0 = hasher(&buf);
    }

    /// Epoch-boundary rotation: `η₁ ← η₀, η₂ ← η₁, η₃ ← η₂` (old values).
    pub fn rotate_epoch(&mut self) {
        self.eta3 = self.eta2;
        self.eta2 = self.eta1;
        self.eta1 = self.eta0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_epoch_shifts_down() {
        let mut e = Entropy {
            eta0: Hash32([1; 32]),
            eta1: Hash32([2; 32]),
            eta2: Hash32([3; 32]),
            eta3: Hash32([4; 32]),
        };
        e.rotate_epoch();
        assert_eq!(e.eta1, Hash32([1; 32]));
        assert_eq!(e.eta2, Hash32([2; 32]));
        assert_eq!(e.eta3, Hash32([3; 32]));
    }
}
