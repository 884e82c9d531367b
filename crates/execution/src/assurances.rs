// Path: crates/execution/src/assurances.rs
//! Assurances extrinsic / availability (spec §4.4): bitfield validation,
//! signature verification, supermajority marking, and timeout eviction.

use jam_crypto::sign::eddsa::{Ed25519PublicKey, Ed25519Signature};
use jam_crypto::sign::VerifyingKey;
use jam_state::components::availability::Availability;
use jam_state::components::statistics::Statistics;
use jam_state::components::validators::ValidatorSet;
use jam_types::block::AssuranceExtrinsicEntry;
use jam_types::error::AssuranceError;
use jam_types::hash::Hash32;
use jam_types::report::WorkReport;
use parity_scale_codec::Encode;
use std::collections::BTreeSet;

/// Applies one block's assurances extrinsic to ρ (spec §4.4): each entry's
/// bitfield length and signature are checked, then every set bit records an
/// assurance on the corresponding core's ρ entry. `parent_hash` is the
/// anchor every assurance must match; since `AssuranceError` carries no
/// dedicated anchor-mismatch variant, a mismatch is folded into
/// `InvalidSignature` rather than invented as a new error.
pub fn apply_assurances(
    rho: &mut Availability,
    entries: &[AssuranceExtrinsicEntry],
    validators: &ValidatorSet,
    parent_hash: Hash32,
    avail_bitfield_bytes: u16,
    supermajority: u16,
    statistics: &mut Statistics,
) -> Result<Vec<WorkReport>, AssuranceError> {
    let mut seen: BTreeSet<u16> = BTreeSet::new();

    for entry in entries {
        if entry.bitfield.len() != avail_bitfield_bytes as usize {
            return Err(AssuranceError::InvalidBitfieldLength {
                got: entry.bitfield.len(),
                expected: avail_bitfield_bytes as usize,
            });
        }
        if !seen.insert(entry.validator_index) {
            return Err(AssuranceError::DuplicateAssurance(entry.validator_index));
        }

        let key = validators
            .get(entry.validator_index as usize)
            .ok_or(AssuranceError::InvalidSignature(entry.validator_index))?;
        if entry.anchor != parent_hash {
            return Err(AssuranceError::InvalidSignature(entry.validator_index));
        }
        let public = Ed25519PublicKey::from_wire(&key.ed25519)
            .map_err(|_| AssuranceError::InvalidSignature(entry.validator_index))?;
        let signature = Ed25519Signature::from_wire(&entry.signature)
            .map_err(|_| AssuranceError::InvalidSignature(entry.validator_index))?;
        let message = (entry.anchor, entry.bitfield.clone()).encode();
        public
            .verify(&message, &signature)
            .map_err(|_| AssuranceError::InvalidSignature(entry.validator_index))?;

        for (core, slot) in rho.cores.iter_mut().enumerate() {
            let bit_set = entry
                .bitfield
                .get(core / 8)
                .map(|byte| byte & (1 << (core % 8)) != 0)
                .unwrap_or(false);
            if !bit_set {
                continue;
            }
            let Some(assignment) = slot else {
                return Err(AssuranceError::NoPendingReport(core as u16));
            };
            if assignment.record_assurance(entry.validator_index, supermajority) {
                statistics.record_assurer(entry.validator_index);
            }
        }
    }

    Ok(rho.extract_available())
}

/// End-of-block availability cleanup (spec §4.4: "timed-out ρ entries are
/// evicted and a refusal statistic incremented"): evicts every entry timed
/// out as of `current_slot` and attributes the refusal to each of its
/// guarantors.
pub fn finalize_availability(rho: &mut Availability, current_slot: u32, statistics: &mut Statistics) {
    for guarantors in rho.evict_timed_out(current_slot) {
        for validator_index in guarantors {
            statistics.record_availability_refusal(validator_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_crypto::sign::eddsa::Ed25519KeyPair;
    use jam_crypto::sign::{SerializableKey, SigningKeyPair};
    use jam_state::components::availability::AvailabilityAssignment;
    use jam_types::keys::{BandersnatchPublic, BlsPublic, ValidatorKey, ValidatorMetadata};
    use jam_types::report::{PackageSpec, ReportContext};

    fn sample_report() -> WorkReport {
        WorkReport {
            package_spec: PackageSpec {
                hash: Hash32::ZERO,
                exports_root: Hash32::ZERO,
                erasure_root: Hash32::ZERO,
                length: 0,
            },
            context: ReportContext {
                anchor: Hash32::ZERO,
                lookup_anchor: Hash32::ZERO,
                prerequisites: vec![],
                state_root: Hash32::ZERO,
            },
            core_index: 0,
            authorization_hash: Hash32::ZERO,
            results: vec![],
            segment_root_lookup: vec![],
        }
    }

    fn validator_with_keypair() -> (ValidatorKey, Ed25519KeyPair) {
        let pair = Ed25519KeyPair::generate().unwrap();
        let wire = pair.public_key().to_wire().unwrap();
        let key = ValidatorKey {
            bandersnatch: BandersnatchPublic::ZERO,
            ed25519: wire,
            bls: BlsPublic::ZERO,
            metadata: ValidatorMetadata::ZERO,
        };
        (key, pair)
    }

    fn signed_entry(pair: &Ed25519KeyPair, validator_index: u16, anchor: Hash32, bitfield: Vec<u8>) -> AssuranceExtrinsicEntry {
        let message = (anchor, bitfield.clone()).encode();
        let signature = pair.sign(&message).unwrap().to_wire().unwrap();
        AssuranceExtrinsicEntry { validator_index, anchor, bitfield, signature }
    }

    #[test]
    fn supermajority_marks_report_available() {
        let (k0, p0) = validator_with_keypair();
        let (k1, p1) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0, k1];
        let anchor = Hash32::ZERO;

        let mut rho = Availability::new(1);
        rho.cores[0] = Some(AvailabilityAssignment::new(sample_report(), 10, vec![0, 1]));
        let mut stats = Statistics::new(2);

        let entries = vec![
            signed_entry(&p0, 0, anchor, vec![0b0000_0001]),
            signed_entry(&p1, 1, anchor, vec![0b0000_0001]),
        ];
        let available =
            apply_assurances(&mut rho, &entries, &validators, anchor, 1, 2, &mut stats).unwrap();
        assert_eq!(available.len(), 1);
        assert!(rho.cores[0].is_none());
    }

    #[test]
    fn wrong_bitfield_length_is_rejected() {
        let (k0, p0) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0];
        let mut rho = Availability::new(1);
        let mut stats = Statistics::new(1);
        let entries = vec![signed_entry(&p0, 0, Hash32::ZERO, vec![0, 0])];
        let result = apply_assurances(&mut rho, &entries, &validators, Hash32::ZERO, 1, 1, &mut stats);
        assert_eq!(result, Err(AssuranceError::InvalidBitfieldLength { got: 2, expected: 1 }));
    }

    #[test]
    fn anchor_mismatch_is_invalid_signature() {
        let (k0, p0) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0];
        let mut rho = Availability::new(1);
        let mut stats = Statistics::new(1);
        let entries = vec![signed_entry(&p0, 0, Hash32([9; 32]), vec![0])];
        let result = apply_assurances(&mut rho, &entries, &validators, Hash32::ZERO, 1, 1, &mut stats);
        assert_eq!(result, Err(AssuranceError::InvalidSignature(0)));
    }

    #[test]
    fn finalize_evicts_timed_out_and_records_refusal() {
        let mut rho = Availability::new(1);
        rho.cores[0] = Some(AvailabilityAssignment::new(sample_report(), 5, vec![2]));
        let mut stats = Statistics::new(3);
        finalize_availability(&mut rho, 10, &mut stats);
        assert!(rho.cores[0].is_none());
        assert_eq!(stats.validators[2].availability_refusals, 1);
    }
}
