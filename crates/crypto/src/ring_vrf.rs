// Path: crates/crypto/src/ring_vrf.rs
//! The ring-VRF interface used by Safrole ticket sealing (§4.2).
//!
//! Real bandersnatch ring-VRF production and verification is an external
//! collaborator (spec.md §1 explicitly specifies the interface only). This
//! module defines that interface as a trait plus one deterministic,
//! explicitly non-cryptographic implementation so the rest of the
//! workspace (and its tests) can exercise the Safrole ticket pipeline
//! end-to-end without a real ring-VRF backend.

use crate::algorithms::hash::blake2b_256;
use crate::error::CryptoError;
use jam_types::keys::BandersnatchPublic;
use jam_types::ticket::RingVrfProof;

/// The signing context tickets are sealed under (§4.2): `"jam_ticket_seal"
/// ‖ η₃ ‖ attempt`.
pub fn ticket_signing_context(eta_3: &[u8; 32], attempt: u8) -> Vec<u8> {
    let mut ctx = Vec::with_capacity(16 + 32 + 1);
    ctx.extend_from_slice(b"jam_ticket_seal");
    ctx.extend_from_slice(eta_3);
    ctx.push(attempt);
    ctx
}

/// A ring of bandersnatch public keys a proof can anonymously attest
/// membership in, and against which ticket proofs are verified.
pub trait RingVrf {
    /// Construct (or refresh) the ring commitment `γ_z` from the member set.
    fn ring_root(&self, members: &[BandersnatchPublic]) -> Result<[u8; 32], CryptoError>;

    /// Produce a proof that `signer` is a member of `members` and that the
    /// proof's output is the VRF evaluation of `context` — without
    /// revealing which member signed.
    fn prove(
        &self,
        members: &[BandersnatchPublic],
        signer_index: usize,
        context: &[u8],
    ) -> Result<RingVrfProof, CryptoError>;

    /// Verify `proof` against the ring committed to by `ring_root` and
    /// `context`, returning the VRF output (the ticket id) on success.
    fn verify(
        &self,
        ring_root: &[u8; 32],
        context: &[u8],
        proof: &RingVrfProof,
    ) -> Result<[u8; 32], CryptoError>;
}

/// A deterministic stand-in for a real ring-VRF backend.
///
/// **Not cryptographically sound**: it proves no anonymity and no
/// membership guarantee beyond what's checked by comparing hashes. It
/// exists purely so the Safrole pipeline (ticket ordering, epoch rotation)
/// can be built and tested against a concrete `RingVrf` implementation
/// while the real bandersnatch ring-VRF backend is supplied externally.
#[derive(Default, Clone, Copy)]
pub struct TestRingVrf;

impl TestRingVrf {
    fn ring_root_bytes(members: &[BandersnatchPublic]) -> [u8; 32] {
        let mut buf = Vec::with_capacity(members.len() * 32);
        for m in members {
            buf.extend_from_slice(m.as_bytes());
        }
        blake2b_256(&buf)
    }
}

impl RingVrf for TestRingVrf {
    fn ring_root(&self, members: &[BandersnatchPublic]) -> Result<[u8; 32], CryptoError> {
        Ok(Self::ring_root_bytes(members))
    }

    fn prove(
        &self,
        members: &[BandersnatchPublic],
        signer_index: usize,
        context: &[u8],
    ) -> Result<RingVrfProof, CryptoError> {
        let signer = members
            .get(signer_index)
            .ok_or_else(|| CryptoError::InvalidKey("signer index out of range for ring".to_string()))?;
        let ring_root = Self::ring_root_bytes(members);
        let mut preimage = Vec::with_capacity(32 + context.len() + 32);
        preimage.extend_from_slice(&ring_root);
        preimage.extend_from_slice(context);
        preimage.extend_from_slice(signer.as_bytes());
        let output = blake2b_256(&preimage);
        // The "proof" carries the ring root, context and output in the
        // clear; a real ring-VRF proof would not reveal `signer`.
        let mut proof_bytes = Vec::with_capacity(32 + context.len() + 32);
        proof_bytes.extend_from_slice(&ring_root);
        proof_bytes.extend_from_slice(context);
        proof_bytes.extend_from_slice(&output);
        Ok(RingVrfProof(proof_bytes))
    }

    fn verify(
        &self,
        ring_root: &[u8; 32],
        context: &[u8],
        proof: &RingVrfProof,
    ) -> Result<[u8; 32], CryptoError> {
        let expected_len = 32 + context.len() + 32;
        if proof.0.len() != expected_len {
            return Err(CryptoError::InvalidSignature(
                "ring-VRF proof has unexpected length".to_string(),
            ));
        }
        let (proof_root, rest) = proof.0.split_at(32);
        let (proof_context, output) = rest.split_at(context.len());
        if proof_root != ring_root || proof_context != context {
            return Err(CryptoError::VerificationFailed);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(output);
        Ok(out)
    }
}
