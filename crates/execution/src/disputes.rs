// Path: crates/execution/src/disputes.rs
//! Disputes extrinsic integration into ψ (spec §4.1 step 4): verdicts,
//! culprits and faults, plus the offender set.

use jam_crypto::sign::eddsa::Ed25519PublicKey;
use jam_crypto::sign::eddsa::Ed25519Signature;
use jam_crypto::sign::VerifyingKey;
use jam_state::components::disputes::Disputes;
use jam_state::components::validators::ValidatorSet;
use jam_types::block::DisputesExtrinsic;
use jam_types::error::DisputeError;
use jam_types::hash::Hash32;
use parity_scale_codec::Encode;

/// The outcome a verdict's judgments settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Good,
    Bad,
    Wonky,
}

/// Applies one block's disputes extrinsic to ψ (spec §4.1 step 4): each
/// verdict's judgments are verified and tallied against `validators` and
/// `supermajority`, reaching `Good`/`Bad`/`Wonky` or `InsufficientJudgments`;
/// culprits and faults that name an already-recorded offender are rejected.
/// Returns the set of newly-judged-bad report hashes so the caller can evict
/// the matching ρ entry (spec §4.1 step 4: "evict any ρ entry whose report
/// is now judged bad").
pub fn apply_disputes(
    disputes: &mut Disputes,
    extrinsic: &DisputesExtrinsic,
    validators: &ValidatorSet,
    supermajority: u16,
) -> Result<Vec<Hash32>, DisputeError> {
    let mut newly_bad = Vec::new();

    for verdict in &extrinsic.verdicts {
        if disputes.good.contains(&verdict.report_hash)
            || disputes.bad.contains(&verdict.report_hash)
            || disputes.wonky.contains(&verdict.report_hash)
        {
            return Err(DisputeError::DuplicateVerdict(verdict.report_hash));
        }

        let mut positive = 0u16;
        let mut negative = 0u16;
        for judgment in &verdict.judgments {
            let key = validators
                .get(judgment.validator_index as usize)
                .ok_or(DisputeError::InvalidJudgmentSignature(judgment.validator_index))?;
            let public = Ed25519PublicKey::from_wire(&key.ed25519)
                .map_err(|_| DisputeError::InvalidJudgmentSignature(judgment.validator_index))?;
            let signature = Ed25519Signature::from_wire(&judgment.signature)
                .map_err(|_| DisputeError::InvalidJudgmentSignature(judgment.validator_index))?;
            let message = (verdict.report_hash, verdict.epoch, judgment.vote).encode();
            public
                .verify(&message, &signature)
                .map_err(|_| DisputeError::InvalidJudgmentSignature(judgment.validator_index))?;

            if judgment.vote {
                positive += 1;
            } else {
                negative += 1;
            }
        }

        let outcome = if positive >= supermajority {
            Outcome::Good
        } else if negative >= supermajority {
            Outcome::Bad
        } else if (positive + negative) as usize == validators.len() {
            Outcome::Wonky
        } else {
            return Err(DisputeError::InsufficientJudgments(verdict.report_hash));
        };

        match outcome {
            Outcome::Good => {
                disputes.good.insert(verdict.report_hash);
            }
            Outcome::Bad => {
                disputes.bad.insert(verdict.report_hash);
                newly_bad.push(verdict.report_hash);
            }
            Outcome::Wonky => {
                disputes.wonky.insert(verdict.report_hash);
            }
        }
    }

    for culprit in &extrinsic.culprits {
        let public = Ed25519PublicKey::from_wire(&culprit.validator_ed25519)
            .map_err(|_| DisputeError::InvalidOffenderSignature(culprit.validator_ed25519))?;
        let signature = Ed25519Signature::from_wire(&culprit.signature)
            .map_err(|_| DisputeError::InvalidOffenderSignature(culprit.validator_ed25519))?;
        let message = culprit.report_hash.encode();
        public
            .verify(&message, &signature)
            .map_err(|_| DisputeError::InvalidOffenderSignature(culprit.validator_ed25519))?;
        if !disputes.offenders.insert(culprit.validator_ed25519) {
            return Err(DisputeError::OffenderAlreadyRecorded);
        }
    }
    for fault in &extrinsic.faults {
        let public = Ed25519PublicKey::from_wire(&fault.validator_ed25519)
            .map_err(|_| DisputeError::InvalidOffenderSignature(fault.validator_ed25519))?;
        let signature = Ed25519Signature::from_wire(&fault.signature)
            .map_err(|_| DisputeError::InvalidOffenderSignature(fault.validator_ed25519))?;
        let message = (fault.report_hash, fault.vote).encode();
        public
            .verify(&message, &signature)
            .map_err(|_| DisputeError::InvalidOffenderSignature(fault.validator_ed25519))?;
        if !disputes.offenders.insert(fault.validator_ed25519) {
            return Err(DisputeError::OffenderAlreadyRecorded);
        }
    }

    Ok(newly_bad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_crypto::sign::eddsa::Ed25519KeyPair;
    use jam_crypto::sign::{SerializableKey, SigningKeyPair};
    use jam_types::block::{Culprit, Judgment, Verdict};
    use jam_types::keys::{BandersnatchPublic, BlsPublic, Ed25519Public, ValidatorKey, ValidatorMetadata};

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

    fn judgment_for(
        pair: &Ed25519KeyPair,
        validator_index: u16,
        report_hash: Hash32,
        epoch: u32,
        vote: bool,
    ) -> Judgment {
        let message = (report_hash, epoch, vote).encode();
        let signature = pair.sign(&message).unwrap().to_wire().unwrap();
        Judgment { validator_index, vote, signature }
    }

    #[test]
    fn supermajority_good_verdict_is_recorded() {
        let (k0, p0) = validator_with_keypair();
        let (k1, p1) = validator_with_keypair();
        let (k2, p2) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0, k1, k2];
        let report_hash = Hash32([1; 32]);

        let verdict = Verdict {
            report_hash,
            epoch: 0,
            judgments: vec![
                judgment_for(&p0, 0, report_hash, 0, true),
                judgment_for(&p1, 1, report_hash, 0, true),
                judgment_for(&p2, 2, report_hash, 0, false),
            ],
        };
        let extrinsic = DisputesExtrinsic { verdicts: vec![verdict], culprits: vec![], faults: vec![] };

        let mut disputes = Disputes::default();
        let newly_bad = apply_disputes(&mut disputes, &extrinsic, &validators, 2).unwrap();
        assert!(newly_bad.is_empty());
        assert!(disputes.good.contains(&report_hash));
    }

    #[test]
    fn supermajority_bad_verdict_is_evicted() {
        let (k0, p0) = validator_with_keypair();
        let (k1, p1) = validator_with_keypair();
        let (k2, p2) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0, k1, k2];
        let report_hash = Hash32([2; 32]);

        let verdict = Verdict {
            report_hash,
            epoch: 0,
            judgments: vec![
                judgment_for(&p0, 0, report_hash, 0, false),
                judgment_for(&p1, 1, report_hash, 0, false),
                judgment_for(&p2, 2, report_hash, 0, true),
            ],
        };
        let extrinsic = DisputesExtrinsic { verdicts: vec![verdict], culprits: vec![], faults: vec![] };

        let mut disputes = Disputes::default();
        let newly_bad = apply_disputes(&mut disputes, &extrinsic, &validators, 2).unwrap();
        assert_eq!(newly_bad, vec![report_hash]);
        assert!(disputes.bad.contains(&report_hash));
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let (k0, p0) = validator_with_keypair();
        let (k1, _p1) = validator_with_keypair();
        let validators: ValidatorSet = vec![k0, k1];
        let report_hash = Hash32([3; 32]);

        let mut bad_judgment = judgment_for(&p0, 0, report_hash, 0, true);
        bad_judgment.validator_index = 1;
        let verdict = Verdict { report_hash, epoch: 0, judgments: vec![bad_judgment] };
        let extrinsic = DisputesExtrinsic { verdicts: vec![verdict], culprits: vec![], faults: vec![] };

        let mut disputes = Disputes::default();
        let result = apply_disputes(&mut disputes, &extrinsic, &validators, 1);
        assert_eq!(result, Err(DisputeError::InvalidJudgmentSignature(1)));
    }

    fn culprit_for(pair: &Ed25519KeyPair, validator_ed25519: Ed25519Public, report_hash: Hash32) -> Culprit {
        let message = report_hash.encode();
        let signature = pair.sign(&message).unwrap().to_wire().unwrap();
        Culprit { report_hash, validator_ed25519, signature }
    }

    #[test]
    fn duplicate_offender_is_rejected() {
        let validators: ValidatorSet = vec![];
        let report_hash = Hash32([4; 32]);
        let pair = Ed25519KeyPair::generate().unwrap();
        let validator_ed25519 = pair.public_key().to_wire().unwrap();
        let culprit = culprit_for(&pair, validator_ed25519, report_hash);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![],
            culprits: vec![culprit.clone(), culprit],
            faults: vec![],
        };

        let mut disputes = Disputes::default();
        let result = apply_disputes(&mut disputes, &extrinsic, &validators, 1);
        assert_eq!(result, Err(DisputeError::OffenderAlreadyRecorded));
    }

    #[test]
    fn culprit_with_forged_signature_is_rejected() {
        let validators: ValidatorSet = vec![];
        let report_hash = Hash32([5; 32]);
        let pair = Ed25519KeyPair::generate().unwrap();
        let other_pair = Ed25519KeyPair::generate().unwrap();
        let validator_ed25519 = pair.public_key().to_wire().unwrap();
        // Signed by a different key than the one it names as the offender.
        let culprit = culprit_for(&other_pair, validator_ed25519, report_hash);
        let extrinsic = DisputesExtrinsic {
            verdicts: vec![],
            culprits: vec![culprit],
            faults: vec![],
        };

        let mut disputes = Disputes::default();
        let result = apply_disputes(&mut disputes, &extrinsic, &validators, 1);
        assert_eq!(result, Err(DisputeError::InvalidOffenderSignature(validator_ed25519)));
        assert!(disputes.offenders.is_empty());
    }
}
