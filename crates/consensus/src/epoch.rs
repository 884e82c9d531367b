// Path: crates/consensus/src/epoch.rs
//! Epoch-boundary rotation, the ticket accumulator, and the deterministic
//! fallback key sequence (spec §4.2).

use jam_crypto::ring_vrf::RingVrf;
use jam_state::components::{EpochSlotMap, Entropy, SafroleState};
use jam_types::error::SafroleError;
use jam_types::hash::Hash32;
use jam_types::keys::{BandersnatchPublic, ValidatorKey};
use jam_types::ticket::Ticket;

use crate::ticket::outside_in_order;

/// A fixed-size validator key set, as used for κ, λ, ι and γ_k.
pub type ValidatorSet = Vec<ValidatorKey>;

/// The slot's epoch index under a fixed `epoch_length` (spec §3.1's slot
/// numbering is a flat counter; epochs are `slot / epoch_length`).
pub fn epoch_of(slot: u32, epoch_length: u32) -> u32 {
    slot / epoch_length
}

/// Rotates the validator sets at an epoch boundary: `ι → γ_k → κ → λ`
/// (spec §4.2). Returns `(new_gamma_k, new_kappa, new_lambda)`; `ι` itself
/// is owned by extrinsic processing outside Safrole and is left unchanged
/// by this step.
pub fn rotate_validators(
    iota: &ValidatorSet,
    gamma_k: &ValidatorSet,
    kappa: &ValidatorSet,
) -> (ValidatorSet, ValidatorSet, ValidatorSet) {
    (iota.clone(), gamma_k.clone(), kappa.clone())
}

/// The deterministic fallback slot-key sequence (spec §4.2): used when the
/// ticket submission window closes without a full `E`-length accumulator.
/// For each slot `i` in the epoch, hashes `η₂ ‖ i` and picks a validator by
/// that hash modulo the validator set size.
pub fn fallback_key_sequence(
    validators: &ValidatorSet,
    eta_2: &Hash32,
    epoch_length: u32,
    hasher: impl Fn(&[u8]) -> Hash32,
) -> Vec<BandersnatchPublic> {
    if validators.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(epoch_length as usize);
    for i in 0..epoch_length {
        let mut buf = Vec::with_capacity(36);
        buf.extend_from_slice(eta_2.as_bytes());
        buf.extend_from_slice(&i.to_le_bytes());
        let digest = hasher(&buf);
        let prefix: [u8; 4] = digest
            .as_bytes()
            .get(0..4)
            .and_then(|s| s.try_into().ok())
            .unwrap_or([0u8; 4]);
        let idx = u32::from_le_bytes(prefix) as usize % validators.len();
        if let Some(v) = validators.get(idx) {
            out.push(v.bandersnatch);
        }
    }
    out
}

/// Merges newly validated tickets into the accumulator `γ_a`, keeping it
/// sorted ascending by id with no duplicates and capped at `epoch_length`
/// entries (spec §3.1's `γ_a.len ≤ E` invariant). When the merge would
/// exceed the cap, the highest-id tickets are dropped first — ties on id
/// cannot occur since duplicates are rejected.
pub fn merge_tickets(
    accumulator: &mut Vec<Ticket>,
    new_tickets: &[Ticket],
    epoch_length: u32,
) -> Result<(), SafroleError> {
    for ticket in new_tickets {
        if accumulator.iter().any(|t| t.id == ticket.id) {
            return Err(SafroleError::DuplicateTicket);
        }
        let pos = accumulator.partition_point(|t| t.id < ticket.id);
        accumulator.insert(pos, *ticket);
    }
    let cap = epoch_length as usize;
    if accumulator.len() > cap {
        accumulator.truncate(cap);
    }
    Ok(())
}

/// Computes `γ_s` for the coming epoch (spec §4.2): the outside-in
/// ordering of `γ_a` when it reached exactly `E` entries, otherwise the
/// fallback key sequence derived from `γ_k` and `η₂`.
pub fn compute_epoch_slot_map(
    accumulator: &[Ticket],
    gamma_k: &ValidatorSet,
    eta_2: &Hash32,
    epoch_length: u32,
    hasher: impl Fn(&[u8]) -> Hash32,
) -> EpochSlotMap {
    if accumulator.len() as u32 == epoch_length {
        EpochSlotMap::Tickets(outside_in_order(accumulator))
    } else {
        EpochSlotMap::FallbackKeys(fallback_key_sequence(gamma_k, eta_2, epoch_length, hasher))
    }
}

/// Performs the full epoch-boundary transition on Safrole and entropy
/// state (spec §4.2 steps (b)): validator rotation, entropy rotation, ring
/// root recomputation, and `γ_s` computation from whatever `γ_a` held at
/// the close of the previous epoch's submission window. `γ_a` is cleared
/// for the new epoch.
pub fn rotate_epoch(
    safrole: &mut SafroleState,
    entropy: &mut Entropy,
    iota: &ValidatorSet,
    kappa: &mut ValidatorSet,
    lambda: &mut ValidatorSet,
    epoch_length: u32,
    ring_vrf: &impl RingVrf,
    hasher: impl Fn(&[u8]) -> Hash32,
) -> Result<(), SafroleError> {
    let (new_gamma_k, new_kappa, new_lambda) = rotate_validators(iota, &safrole.gamma_k, kappa);
    *kappa = new_kappa;
    *lambda = new_lambda;

    safrole.gamma_s = compute_epoch_slot_map(
        &safrole.gamma_a,
        &safrole.gamma_k,
        &entropy.eta2,
        epoch_length,
        &hasher,
    );
    safrole.gamma_a.clear();

    entropy.rotate_epoch();

    let members: Vec<BandersnatchPublic> = new_gamma_k.iter().map(|v| v.bandersnatch).collect();
    let ring_root = ring_vrf
        .ring_root(&members)
        .map_err(|_| SafroleError::BadTicketProof)?;
    safrole.gamma_k = new_gamma_k;
    safrole.gamma_z = Hash32(ring_root);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_crypto::algorithms::hash::blake2b_256;
    use jam_crypto::ring_vrf::TestRingVrf;
    use jam_types::keys::{BlsPublic, Ed25519Public, ValidatorMetadata};

    fn key(tag: u8) -> ValidatorKey {
        ValidatorKey {
            bandersnatch: BandersnatchPublic([tag; 32]),
            ed25519: Ed25519Public([tag; 32]),
            bls: BlsPublic([tag; 144]),
            metadata: ValidatorMetadata([tag; 128]),
        }
    }

    #[test]
    fn rotate_validators_shifts_in_order() {
        let iota = vec![key(1)];
        let gamma_k = vec![key(2)];
        let kappa = vec![key(3)];
        let (new_gamma_k, new_kappa, new_lambda) = rotate_validators(&iota, &gamma_k, &kappa);
        assert_eq!(new_gamma_k, iota);
        assert_eq!(new_kappa, gamma_k);
        assert_eq!(new_lambda, kappa);
    }

    #[test]
    fn merge_tickets_rejects_duplicates() {
        let mut acc = vec![Ticket { id: Hash32([1; 32]), attempt: 0 }];
        let new = vec![Ticket { id: Hash32([1; 32]), attempt: 1 }];
        assert_eq!(merge_tickets(&mut acc, &new, 12), Err(SafroleError::DuplicateTicket));
    }

    #[test]
    fn merge_tickets_keeps_sorted_and_capped() {
        let mut acc = vec![Ticket { id: Hash32([5; 32]), attempt: 0 }];
        let new = vec![
            Ticket { id: Hash32([1; 32]), attempt: 0 },
            Ticket { id: Hash32([9; 32]), attempt: 0 },
        ];
        merge_tickets(&mut acc, &new, 2).unwrap();
        assert_eq!(acc.len(), 2);
        assert!(acc.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn fallback_sequence_has_epoch_length_entries() {
        let validators = vec![key(1), key(2), key(3)];
        let eta_2 = Hash32([9; 32]);
        let seq = fallback_key_sequence(&validators, &eta_2, 12, blake2b_256_as_hash);
        assert_eq!(seq.len(), 12);
    }

    #[test]
    fn epoch_slot_map_uses_tickets_when_accumulator_full() {
        let gamma_k = vec![key(1)];
        let eta_2 = Hash32([9; 32]);
        let tickets = vec![
            Ticket { id: Hash32([1; 32]), attempt: 0 },
            Ticket { id: Hash32([2; 32]), attempt: 0 },
        ];
        let map = compute_epoch_slot_map(&tickets, &gamma_k, &eta_2, 2, blake2b_256_as_hash);
        assert!(matches!(map, EpochSlotMap::Tickets(_)));
    }

    #[test]
    fn epoch_slot_map_falls_back_when_accumulator_short() {
        let gamma_k = vec![key(1)];
        let eta_2 = Hash32([9; 32]);
        let tickets = vec![Ticket { id: Hash32([1; 32]), attempt: 0 }];
        let map = compute_epoch_slot_map(&tickets, &gamma_k, &eta_2, 2, blake2b_256_as_hash);
        assert!(matches!(map, EpochSlotMap::FallbackKeys(_)));
    }

    #[test]
    fn rotate_epoch_clears_accumulator_and_recomputes_ring_root() {
        let mut safrole = SafroleState::new(vec![key(2)]);
        safrole.gamma_a = vec![Ticket { id: Hash32([1; 32]), attempt: 0 }];
        let mut entropy = Entropy::zero();
        let iota = vec![key(1)];
        let mut kappa = vec![key(3)];
        let mut lambda = vec![key(4)];
        let ring_vrf = TestRingVrf;
        rotate_epoch(
            &mut safrole,
            &mut entropy,
            &iota,
            &mut kappa,
            &mut lambda,
            12,
            &ring_vrf,
            blake2b_256_as_hash,
        )
        .unwrap();
        assert!(safrole.gamma_a.is_empty());
        assert_eq!(safrole.gamma_k, iota);
        assert_ne!(safrole.gamma_z, Hash32::ZERO);
    }

    fn blake2b_256_as_hash(input: &[u8]) -> Hash32 {
        Hash32(blake2b_256(input))
    }
}
