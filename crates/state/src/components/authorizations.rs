// Path: crates/state/src/components/authorizations.rs
//! α, φ: per-core authorization pool and queue (spec §3.1, §4.1 step 6).

use jam_types::hash::Hash32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// `α`: one bounded FIFO of authorization hashes per core, `len ≤ O`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AuthPools {
    pub pools: Vec<VecDeque<Hash32>>,
}

impl AuthPools {
    pub fn new(core_count: u16) -> Self {
        Self {
            pools: (0..core_count).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Removes `hash` from `core`'s pool if present. Returns whether it was
    /// found.
    pub fn remove(&mut self, core: usize, hash: &Hash32) -> bool {
        let Some(pool) = self.pools.get_mut(core) else {
            return false;
        };
        if let Some(pos) = pool.iter().position(|h| h == hash) {
            pool.remove(pos);
            true
        } else {
            false
        }
    }

    /// Rotates one entry from the authorization queue into `core`'s pool,
    /// evicting the oldest entry when the pool is already at `max_items`
    /// (spec §4.1 step 6: FIFO, oldest evicted when full).
    pub fn rotate_in(&mut self, core: usize, hash: Hash32, max_items: usize) {
        let Some(pool) = self.pools.get_mut(core) else {
            return;
        };
        if pool.len() >= max_items {
            pool.pop_front();
        }
        pool.push_back(hash);
    }

    pub fn within_bound(&self, max_items: usize) -> bool {
        self.pools.iter().all(|p| p.len() <= max_items)
    }
}

/// `φ`: a fixed-length (per core) ring of pre-staged authorizers, length Q,
/// indexed by `τ mod Q`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AuthQueues {
    pub queues: Vec<Vec<Hash32>>,
}

impl AuthQueues {
    pub fn new(core_count: u16, queue_len: usize) -> Self {
        Self {
            queues: (0..core_count)
                .map(|_| vec![Hash32::ZERO; queue_len])
                .collect(),
        }
    }

    pub fn slot_entry(&self, core: usize, slot_index: usize) -> Option<Hash32> {
        self.queues.get(core)?.get(slot_index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_in_evicts_oldest_when_full() {
        let mut pools = AuthPools::new(1);
        pools.pools[0] = VecDeque::from([Hash32([1; 32]), Hash32([2; 32]), Hash32([3; 32])]);
        pools.rotate_in(0, Hash32([4; 32]), 3);
        assert_eq!(
            pools.pools[0],
            VecDeque::from([Hash32([2; 32]), Hash32([3; 32]), Hash32([4; 32])])
        );
    }

    #[test]
    fn remove_reports_presence() {
        let mut pools = AuthPools::new(1);
        pools.pools[0] = VecDeque::from([Hash32([1; 32])]);
        assert!(pools.remove(0, &Hash32([1; 32])));
        assert!(!pools.remove(0, &Hash32([1; 32])));
    }
}
