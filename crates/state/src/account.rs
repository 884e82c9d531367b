// Path: crates/state/src/account.rs
//! Service account model (spec §3.2).

use jam_types::hash::Hash32;
use jam_types::keys::{ServiceId, TimeSlot};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A storage entry: either a raw storage value or a preimage blob, both
/// stored against a 32-byte key in the same mapping (spec §3.2).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct StorageEntry(pub Vec<u8>);

/// Per-byte/per-item cost used to derive the account's threshold balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootprintCost {
    pub base: u64,
    pub per_item: u64,
    pub per_byte: u64,
}

impl Default for FootprintCost {
    fn default() -> Self {
        Self {
            base: 0,
            per_item: 10,
            per_byte: 1,
        }
    }
}

/// Outcome of a `write_storage` host-call invocation (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write (or delete) went through; carries the prior value's
    /// length, or `None` if the key did not previously exist.
    Written(Option<usize>),
    /// The prospective footprint would have left the account insolvent;
    /// storage is unchanged.
    Full,
}

/// A single on-chain service account.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub code_hash: Hash32,
    pub balance: u64,
    pub min_gas_accumulate: u64,
    pub min_gas_on_transfer: u64,
    pub storage_offset: u64,
    pub creation_slot: TimeSlot,
    pub last_accumulation_slot: TimeSlot,
    pub parent_service: ServiceId,
    /// Storage and preimages, both keyed by a 32-byte hash.
    pub storage: BTreeMap<Hash32, StorageEntry>,
    /// Preimage solicitation log: the slot at which each currently
    /// outstanding preimage hash was requested (spec §4.1 step 5's
    /// solicitation window). An entry is removed once its preimage is
    /// integrated or the account forgets the request.
    pub preimage_requests: BTreeMap<Hash32, TimeSlot>,
}

impl ServiceAccount {
    pub fn new(
        code_hash: Hash32,
        balance: u64,
        min_gas_accumulate: u64,
        min_gas_on_transfer: u64,
        creation_slot: TimeSlot,
        parent_service: ServiceId,
    ) -> Self {
        Self {
            code_hash,
            balance,
            min_gas_accumulate,
            min_gas_on_transfer,
            storage_offset: 0,
            creation_slot,
            last_accumulation_slot: creation_slot,
            parent_service,
            storage: BTreeMap::new(),
            preimage_requests: BTreeMap::new(),
        }
    }

    /// Records a solicitation for `hash` at `slot` (the graypaper's
    /// `solicit` host call), opening the window within which a matching
    /// preimages-extrinsic entry may be integrated.
    pub fn solicit_preimage(&mut self, hash: Hash32, slot: TimeSlot) {
        self.storage
            .entry(hash)
            .or_insert_with(|| StorageEntry(Vec::new()));
        self.preimage_requests.insert(hash, slot);
    }

    /// `a_o`: total bytes held in storage.
    pub fn footprint_bytes(&self) -> u64 {
        self.storage
            .values()
            .map(|v| v.0.len() as u64)
            .sum::<u64>()
            + self.storage_offset
    }

    /// `a_i`: number of storage items.
    pub fn footprint_items(&self) -> u64 {
        self.storage.len() as u64
    }

    /// `a_t`: threshold balance implied by the current footprint.
    pub fn threshold_balance(&self, cost: &FootprintCost) -> u64 {
        cost.base
            + cost.per_item * self.footprint_items()
            + cost.per_byte * self.footprint_bytes()
    }

    /// Whether `balance` still covers `a_t` given the current footprint.
    pub fn is_solvent(&self, cost: &FootprintCost) -> bool {
        self.balance >= self.threshold_balance(cost)
    }

    /// Reads a storage entry (storage value or preimage) by key.
    pub fn get(&self, key: &Hash32) -> Option<&[u8]> {
        self.storage.get(key).map(|e| e.0.as_slice())
    }

    /// Writes (or, if `value` is empty, deletes) a storage entry, enforcing
    /// the write_storage solvency policy (spec §4.6): the prospective
    /// footprint is computed first, and if it would push `a_t` above
    /// `balance` the write is rejected with `WriteOutcome::Full` and the
    /// account is left unmodified.
    pub fn write(
        &mut self,
        key: Hash32,
        value: Vec<u8>,
        cost: &FootprintCost,
    ) -> WriteOutcome {
        let prior_len = self.storage.get(&key).map(|e| e.0.len());
        let mut trial = self.storage.clone();
        if value.is_empty() {
            trial.remove(&key);
        } else {
            trial.insert(key, StorageEntry(value));
        }
        let trial_bytes: u64 = trial.values().map(|v| v.0.len() as u64).sum::<u64>()
            + self.storage_offset;
        let trial_items = trial.len() as u64;
        let trial_threshold =
            cost.base + cost.per_item * trial_items + cost.per_byte * trial_bytes;
        if trial_threshold > self.balance {
            return WriteOutcome::Full;
        }
        self.storage = trial;
        WriteOutcome::Written(prior_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> ServiceAccount {
        ServiceAccount::new(Hash32::ZERO, 1_000_000, 100, 100, 0, 0)
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut a = account();
        let key = Hash32([1u8; 32]);
        let outcome = a.write(key, b"hello".to_vec(), &FootprintCost::default());
        assert_eq!(outcome, WriteOutcome::Written(None));
        assert_eq!(a.get(&key), Some(b"hello".as_slice()));
        assert!(a.is_solvent(&FootprintCost::default()));
    }

    #[test]
    fn zero_length_value_deletes() {
        let mut a = account();
        let key = Hash32([2u8; 32]);
        a.write(key, b"x".to_vec(), &FootprintCost::default());
        let outcome = a.write(key, Vec::new(), &FootprintCost::default());
        assert_eq!(outcome, WriteOutcome::Written(Some(1)));
        assert!(a.get(&key).is_none());
    }

    #[test]
    fn insolvent_write_is_rejected() {
        let mut a = ServiceAccount::new(Hash32::ZERO, 0, 0, 0, 0, 0);
        let key = Hash32([3u8; 32]);
        let outcome = a.write(key, vec![0u8; 64], &FootprintCost::default());
        assert_eq!(outcome, WriteOutcome::Full);
        assert!(a.storage.is_empty());
    }
}
