// Path: crates/execution/src/guarantees.rs
//! Guarantees extrinsic / work-report validation (spec §4.3): the nine
//! validation rules, guarantor-assignment permutation, and placement of
//! accepted reports on ρ.

use jam_crypto::sign::eddsa::{Ed25519PublicKey, Ed25519Signature};
use jam_crypto::sign::VerifyingKey;
use jam_state::components::accumulated_history::AccumulatedHistory;
use jam_state::components::availability::AvailabilityAssignment;
use jam_state::components::history::RecentHistory;
use jam_state::components::validators::ValidatorSet;
use jam_state::sigma::ServiceAccounts;
use jam_types::block::ReportGuarantee;
use jam_types::config::Params;
use jam_types::hash::Hash32;
use jam_types::keys::Ed25519Public;
use parity_scale_codec::Encode;
use std::collections::BTreeSet;

use crate::authorizations::AuthorizedThisBlock;
use jam_consensus::prelude::epoch_of;

/// Per-core limit on a work result's output payload (spec §4.3 rule 3: no
/// concrete byte limit is given, so this mirrors the work package length
/// cap used elsewhere in the pipeline).
pub const MAX_RESULT_OUTPUT_BYTES: usize = 1 << 16;

fn seed_u64(bytes: &[u8; 32]) -> u64 {
    let mut out = 0u64;
    for (i, b) in bytes.iter().take(8).enumerate() {
        out |= (*b as u64) << (8 * i);
    }
    out
}

/// Deterministic Fisher-Yates shuffle of `0..n`, seeded by hashing `seed`
/// together with the current shuffle position (spec §4.3: "shuffle the
/// sequence `[0..V]` using Fisher-Yates seeded by `Q(i, H(η_k ‖ slot))`").
pub fn fisher_yates_shuffle(seed: Hash32, n: usize, hasher: impl Fn(&[u8]) -> Hash32) -> Vec<usize> {
    let mut arr: Vec<usize> = (0..n).collect();
    let mut i = n;
    while i > 1 {
        i -= 1;
        let mut buf = Vec::with_capacity(36);
        buf.extend_from_slice(seed.as_bytes());
        buf.extend_from_slice(&(i as u32).to_le_bytes());
        let digest = hasher(&buf);
        let r = seed_u64(digest.as_bytes());
        let j = (r % (i as u64 + 1)) as usize;
        arr.swap(i, j);
    }
    arr
}

/// Computes the guarantor assignment for every core at `slot`: a Fisher-
/// Yates permutation of `0..validators_count`, seeded by `entropy ‖ slot`,
/// chunked into `validators_count / core_count` validators per core, then
/// cyclically shifted by `slot mod rotation_period` (spec §4.3: "Rotation
/// applies a cyclic shift of `slot mod R`").
pub fn guarantor_assignment(
    entropy: Hash32,
    slot: u32,
    validators_count: u16,
    core_count: u16,
    rotation_period: u32,
    hasher: impl Fn(&[u8]) -> Hash32,
) -> Vec<Vec<u16>> {
    if core_count == 0 || validators_count == 0 {
        return Vec::new();
    }
    let mut seed_bytes = Vec::with_capacity(36);
    seed_bytes.extend_from_slice(entropy.as_bytes());
    seed_bytes.extend_from_slice(&slot.to_le_bytes());
    let seed = hasher(&seed_bytes);
    let permuted = fisher_yates_shuffle(seed, validators_count as usize, &hasher);

    let chunk_size = (validators_count / core_count).max(1) as usize;
    let shift = if rotation_period == 0 {
        0
    } else {
        (slot % rotation_period) as usize % core_count as usize
    };

    (0..core_count as usize)
        .map(|core| {
            let source_core = (core + shift) % core_count as usize;
            let start = (source_core * chunk_size).min(permuted.len());
            let end = (start + chunk_size).min(permuted.len());
            permuted
                .get(start..end)
                .unwrap_or(&[])
                .iter()
                .map(|&v| v as u16)
                .collect()
        })
        .collect()
}

/// Context shared by every guarantee in one block's extrinsic.
pub struct GuaranteeContext<'a> {
    /// κ: the current epoch's active validator set.
    pub validators: &'a ValidatorSet,
    /// λ: the previous epoch's validator set, used to verify guarantees
    /// whose `slot` falls before the most recent epoch boundary (spec
    /// §4.3 rule 9: "signatures verify against κ or λ depending on slot
    /// rotation").
    pub previous_validators: &'a ValidatorSet,
    pub offenders: &'a BTreeSet<Ed25519Public>,
    pub recent_history: &'a RecentHistory,
    pub accumulated_history: &'a AccumulatedHistory,
    pub delta: &'a ServiceAccounts,
    pub entropy: Hash32,
    pub current_slot: u32,
    pub params: &'a Params,
}

/// One validated guarantee's effect: the report to place on ρ (with its
/// timeout and attributed guarantor set) and the authorization hash it
/// consumes from its core's pool.
pub struct AcceptedGuarantee {
    pub core: u16,
    pub assignment: AvailabilityAssignment,
    pub authorized: AuthorizedThisBlock,
}

/// Validates and applies one block's guarantees extrinsic (spec §4.3),
/// scanned in strictly-increasing `core_index`. Accepts a hashing function
/// (used both for the permutation seed and the entropy-fold) so callers
/// supply `jam_crypto`'s `blake2b_256` without this module depending on it
/// directly for anything beyond the permutation.
pub fn validate_guarantees_extrinsic(
    guarantees: &[ReportGuarantee],
    ctx: &GuaranteeContext<'_>,
    hasher: impl Fn(&[u8]) -> Hash32 + Copy,
) -> Result<Vec<AcceptedGuarantee>, jam_types::error::ReportError> {
    use jam_types::error::ReportError;

    let core_count = ctx.params.core_count;
    let mut seen_packages: BTreeSet<Hash32> = BTreeSet::new();
    for g in guarantees {
        seen_packages.insert(g.report.package_spec.hash);
    }

    let mut accepted = Vec::with_capacity(guarantees.len());
    let mut last_core: Option<u16> = None;

    for guarantee in guarantees {
        let report = &guarantee.report;
        let core = report.core_index;

        // Rule 9 pre-req: core must be valid before indexing the assignment table.
        if core >= core_count {
            return Err(ReportError::BadCoreIndex { core });
        }
        if let Some(prev) = last_core {
            if core <= prev {
                return Err(ReportError::OutOfOrderGuarantee);
            }
        }
        last_core = Some(core);

        // Rule 1.
        if report.results.is_empty() {
            return Err(ReportError::MissingWorkResults { core });
        }

        // Rule 2.
        let total_gas = report.total_accumulate_gas();
        if total_gas > ctx.params.gas_alloc_accumulation {
            return Err(ReportError::WorkReportGasTooHigh {
                got: total_gas,
                max: ctx.params.gas_alloc_accumulation,
            });
        }

        // Rule 3.
        for result in &report.results {
            if let jam_types::report::WorkResultPayload::Ok(bytes) = &result.payload {
                if bytes.len() > MAX_RESULT_OUTPUT_BYTES {
                    return Err(ReportError::OutputTooLarge);
                }
            }
        }

        // Rule 4.
        if !ctx.recent_history.contains_anchor(&report.context.anchor) {
            return Err(ReportError::UnknownContextAnchor(report.context.anchor));
        }
        // lookup_anchor must both be present and within `max_lookup_anchor_age`
        // slots of the current block (spec §4.3 rule 4), not merely still
        // inside the (generally much larger) recent-history window.
        let lookup_slot = ctx
            .recent_history
            .slot_of(&report.context.lookup_anchor)
            .ok_or(ReportError::LookupAnchorNotRecent)?;
        let age = ctx.current_slot.saturating_sub(lookup_slot);
        if age > ctx.params.max_lookup_anchor_age {
            return Err(ReportError::LookupAnchorNotRecent);
        }

        // Rule 5.
        let min_slot = ctx.current_slot.saturating_sub(ctx.params.rotation_period);
        if guarantee.slot > ctx.current_slot || guarantee.slot < min_slot {
            return Err(ReportError::SlotOutOfRange);
        }

        // Rule 6.
        for result in &report.results {
            let account = ctx
                .delta
                .get(&result.service_id)
                .ok_or(ReportError::UnknownService(result.service_id))?;
            if account.code_hash != result.code_hash {
                return Err(ReportError::CodeHashMismatch { service: result.service_id });
            }
        }

        // Rule 7.
        for dep in report
            .context
            .prerequisites
            .iter()
            .chain(report.segment_root_lookup.iter())
        {
            let in_batch = seen_packages.contains(dep) && dep != &report.package_spec.hash;
            let in_history = ctx.accumulated_history.contains(dep);
            if !in_batch && !in_history {
                return Err(ReportError::UnresolvedPrerequisite(*dep));
            }
        }

        // Rule 8.
        let mut dup_in_batch = 0usize;
        for g in guarantees {
            if g.report.package_spec.hash == report.package_spec.hash {
                dup_in_batch += 1;
            }
        }
        if dup_in_batch > 1 || ctx.recent_history.contains_package(&report.package_spec.hash) {
            return Err(ReportError::DuplicatePackage(report.package_spec.hash));
        }

        // Rule 9: guarantor assignment, offender exclusion, signature verification.
        let assignment = guarantor_assignment(
            ctx.entropy,
            guarantee.slot,
            ctx.params.validators_count,
            core_count,
            ctx.params.rotation_period,
            hasher,
        );
        let assigned: &[u16] = assignment
            .get(core as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        // Rule 9: a guarantee from the previous epoch's rotation window
        // verifies against λ instead of κ.
        let guarantee_epoch = epoch_of(guarantee.slot, ctx.params.epoch_length);
        let current_epoch = epoch_of(ctx.current_slot, ctx.params.epoch_length);
        let signing_validators = if guarantee_epoch == current_epoch {
            ctx.validators
        } else {
            ctx.previous_validators
        };

        let message = report.encode();
        let mut valid_signers: BTreeSet<u16> = BTreeSet::new();
        for sig in &guarantee.signatures {
            if !assigned.contains(&sig.validator_index) {
                return Err(ReportError::BadGuarantorAssignment { validator: sig.validator_index, core });
            }
            let key = signing_validators
                .get(sig.validator_index as usize)
                .ok_or(ReportError::InvalidGuarantorSignature(sig.validator_index))?;
            if ctx.offenders.contains(&key.ed25519) {
                return Err(ReportError::OffenderGuarantor(sig.validator_index));
            }
            let public = Ed25519PublicKey::from_wire(&key.ed25519)
                .map_err(|_| ReportError::InvalidGuarantorSignature(sig.validator_index))?;
            let signature = Ed25519Signature::from_wire(&sig.signature)
                .map_err(|_| ReportError::InvalidGuarantorSignature(sig.validator_index))?;
            public
                .verify(&message, &signature)
                .map_err(|_| ReportError::InvalidGuarantorSignature(sig.validator_index))?;
            valid_signers.insert(sig.validator_index);
        }
        let need = assigned.len() as u16;
        let got = valid_signers.len() as u16;
        if got < need {
            return Err(ReportError::InsufficientGuarantees { core, got, need });
        }

        accepted.push(AcceptedGuarantee {
            core,
            assignment: AvailabilityAssignment::new(
                report.clone(),
                ctx.current_slot + ctx.params.report_timeout,
                assigned.to_vec(),
            ),
            authorized: AuthorizedThisBlock { core, auth_hash: report.authorization_hash },
        });
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_hash(bytes: &[u8]) -> Hash32 {
        let mut out = [0u8; 32];
        for (i, b) in bytes.iter().enumerate() {
            out[i % 32] ^= b;
        }
        Hash32(out)
    }

    #[test]
    fn fisher_yates_is_a_permutation() {
        let shuffled = fisher_yates_shuffle(Hash32([7; 32]), 20, xor_hash);
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn guarantor_assignment_chunks_evenly() {
        let assignment = guarantor_assignment(Hash32([1; 32]), 0, 6, 2, 4, xor_hash);
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment[0].len() + assignment[1].len(), 6);
    }

    #[test]
    fn guarantor_assignment_is_deterministic() {
        let a = guarantor_assignment(Hash32([3; 32]), 5, 6, 2, 4, xor_hash);
        let b = guarantor_assignment(Hash32([3; 32]), 5, 6, 2, 4, xor_hash);
        assert_eq!(a, b);
    }
}
