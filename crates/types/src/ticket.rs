// Path: crates/types/src/ticket.rs
//! Safrole ticket wire and canonical forms (§4.2).

use crate::hash::Hash32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// An opaque ring-VRF proof. Real bandersnatch ring-VRF production and
/// verification is an external collaborator (spec scope cut); this crate
/// only needs a stable byte container to carry the proof through the wire
/// codec and into `jam_crypto`'s `RingVrf` trait.
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RingVrfProof(pub Vec<u8>);

impl std::fmt::Debug for RingVrfProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RingVrfProof({} bytes)", self.0.len())
    }
}

/// A ticket as carried in the block's tickets extrinsic: the prover submits
/// an attempt number and a ring-VRF proof; the ticket's `id` is the proof's
/// verified output, not carried directly on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TicketEnvelope {
    /// Which of the `0..max_ticket_attempts` attempts this proof is for.
    pub attempt: u8,
    /// The ring-VRF proof over `"jam_ticket_seal" || eta_3 || attempt`.
    pub proof: RingVrfProof,
}

/// A canonical ticket: `{ id, attempt }` (§4.2), the form stored in γ_a and
/// used for strict ordering and the outside-in permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize)]
pub struct Ticket {
    /// The ring-VRF output, used as the sort key.
    pub id: Hash32,
    /// The attempt number the ticket was produced for.
    pub attempt: u8,
}
