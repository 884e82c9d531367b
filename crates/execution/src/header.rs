// Path: crates/execution/src/header.rs
//! Header validation (spec §4.1 step 1): slot monotonicity, author index
//! range, and the two bandersnatch ring-VRF signatures the header carries.
//!
//! The real seal/entropy-source signing contexts are an external
//! collaborator concern the same way ticket ring-VRF is (spec §1's scope
//! cut); this module verifies both against a single-member ring of the
//! author's own bandersnatch key, which is sufficient to exercise the
//! orchestrator end-to-end against `RingVrf`'s interface.

use jam_crypto::ring_vrf::RingVrf;
use jam_state::components::validators::ValidatorSet;
use jam_types::block::Header;
use jam_types::error::HeaderError;
use jam_types::hash::Hash32;
use jam_types::ticket::RingVrfProof;

fn seal_context(label: &[u8], parent_hash: &Hash32, slot: u32) -> Vec<u8> {
    let mut ctx = Vec::with_capacity(label.len() + 32 + 4);
    ctx.extend_from_slice(label);
    ctx.extend_from_slice(parent_hash.as_bytes());
    ctx.extend_from_slice(&slot.to_le_bytes());
    ctx
}

/// Validates `header` against its parent slot and the active validator set
/// `kappa`, verifying both bandersnatch signatures. Returns the verified
/// entropy-source VRF output, which feeds η₀'s per-block accumulation.
pub fn validate_header(
    header: &Header,
    parent_slot: u32,
    kappa: &ValidatorSet,
    ring: &impl RingVrf,
) -> Result<[u8; 32], HeaderError> {
    if header.slot <= parent_slot {
        return Err(HeaderError::SlotNotMonotonic {
            parent: parent_slot,
            got: header.slot,
        });
    }
    let author = kappa
        .get(header.author_index as usize)
        .ok_or(HeaderError::InvalidAuthorIndex {
            index: header.author_index,
            validator_count: kappa.len() as u16,
        })?;

    let ring_members = [author.bandersnatch];
    let ring_root = ring
        .ring_root(&ring_members)
        .map_err(|_| HeaderError::BadSealSignature)?;

    let entropy_context = seal_context(b"jam_entropy_source", &header.parent_hash, header.slot);
    let entropy_proof = RingVrfProof(header.entropy_source.as_bytes().to_vec());
    let entropy_output = ring
        .verify(&ring_root, &entropy_context, &entropy_proof)
        .map_err(|_| HeaderError::BadEntropySourceSignature)?;

    let seal_context_bytes = seal_context(b"jam_block_seal", &header.parent_hash, header.slot);
    let seal_proof = RingVrfProof(header.seal.as_bytes().to_vec());
    ring.verify(&ring_root, &seal_context_bytes, &seal_proof)
        .map_err(|_| HeaderError::BadSealSignature)?;

    Ok(entropy_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_crypto::ring_vrf::TestRingVrf;
    use jam_types::block::EpochMark;
    use jam_types::keys::{BandersnatchSeal, BlsPublic, Ed25519Public, ValidatorKey, ValidatorMetadata};

    fn header_for(author_index: u16, slot: u32, ring: &TestRingVrf, author_key: jam_types::keys::BandersnatchPublic) -> Header {
        let ring_members = [author_key];
        let ring_root = ring.ring_root(&ring_members).unwrap();
        let parent_hash = Hash32::ZERO;
        let entropy_context = seal_context(b"jam_entropy_source", &parent_hash, slot);
        let entropy_proof = ring.prove(&ring_members, 0, &entropy_context).unwrap();
        let seal_bytes = seal_context(b"jam_block_seal", &parent_hash, slot);
        let seal_proof = ring.prove(&ring_members, 0, &seal_bytes).unwrap();

        let mut entropy_source = [0u8; 96];
        let len = entropy_proof.0.len().min(96);
        if let Some(dst) = entropy_source.get_mut(..len) {
            if let Some(src) = entropy_proof.0.get(..len) {
                dst.copy_from_slice(src);
            }
        }
        let mut seal = [0u8; 96];
        let len = seal_proof.0.len().min(96);
        if let Some(dst) = seal.get_mut(..len) {
            if let Some(src) = seal_proof.0.get(..len) {
                dst.copy_from_slice(src);
            }
        }

        Header {
            parent_hash,
            parent_state_root: Hash32::ZERO,
            extrinsic_hash: Hash32::ZERO,
            slot,
            epoch_mark: Option::<EpochMark>::None,
            tickets_mark: None,
            offenders_mark: None,
            author_index,
            entropy_source: BandersnatchSeal(entropy_source),
            seal: BandersnatchSeal(seal),
        }
    }

    fn validator_set(author_key: jam_types::keys::BandersnatchPublic) -> ValidatorSet {
        vec![ValidatorKey {
            bandersnatch: author_key,
            ed25519: Ed25519Public::ZERO,
            bls: BlsPublic::ZERO,
            metadata: ValidatorMetadata::ZERO,
        }]
    }

    #[test]
    fn non_monotonic_slot_is_rejected() {
        let ring = TestRingVrf;
        let key = jam_types::keys::BandersnatchPublic([1; 32]);
        let header = header_for(0, 5, &ring, key);
        let result = validate_header(&header, 5, &validator_set(key), &ring);
        assert_eq!(result, Err(HeaderError::SlotNotMonotonic { parent: 5, got: 5 }));
    }

    #[test]
    fn invalid_author_index_is_rejected() {
        let ring = TestRingVrf;
        let key = jam_types::keys::BandersnatchPublic([1; 32]);
        let header = header_for(3, 5, &ring, key);
        let result = validate_header(&header, 0, &validator_set(key), &ring);
        assert_eq!(
            result,
            Err(HeaderError::InvalidAuthorIndex { index: 3, validator_count: 1 })
        );
    }

    #[test]
    fn well_formed_header_verifies() {
        let ring = TestRingVrf;
        let key = jam_types::keys::BandersnatchPublic([1; 32]);
        let header = header_for(0, 5, &ring, key);
        let result = validate_header(&header, 0, &validator_set(key), &ring);
        assert!(result.is_ok());
    }
}
