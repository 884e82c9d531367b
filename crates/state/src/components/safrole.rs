// Path: crates/state/src/components/safrole.rs
//! γ: the Safrole epoch/ticket state (spec §3.1, §4.2).

use jam_types::hash::Hash32;
use jam_types::keys::BandersnatchPublic;
use jam_types::ticket::Ticket;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::validators::ValidatorSet;

/// `γ_s`: the per-slot assignment for the current epoch, either the
/// outside-in ordering of accumulated tickets or the deterministic
/// fallback key sequence (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EpochSlotMap {
    Tickets(Vec<Ticket>),
    FallbackKeys(Vec<BandersnatchPublic>),
}

impl EpochSlotMap {
    pub fn len(&self) -> usize {
        match self {
            Self::Tickets(t) => t.len(),
            Self::FallbackKeys(k) => k.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Safrole state γ.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SafroleState {
    /// `γ_k`: pending next-epoch validator set.
    pub gamma_k: ValidatorSet,
    /// `γ_z`: bandersnatch ring root committing to `γ_k`.
    pub gamma_z: Hash32,
    /// `γ_s`: the current epoch's slot assignment.
    pub gamma_s: EpochSlotMap,
    /// `γ_a`: the ticket accumulator, sorted ascending by id, `len ≤ E`.
    pub gamma_a: Vec<Ticket>,
}

impl SafroleState {
    pub fn new(gamma_k: ValidatorSet) -> Self {
        Self {
            gamma_k,
            gamma_z: Hash32::ZERO,
            gamma_s: EpochSlotMap::FallbackKeys(Vec::new()),
            gamma_a: Vec::new(),
        }
    }

    /// `γ_a.len ≤ E` invariant check (spec §3.1).
    pub fn ticket_accumulator_within_bound(&self, epoch_length: u32) -> bool {
        self.gamma_a.len() <= epoch_length as usize
    }
}
