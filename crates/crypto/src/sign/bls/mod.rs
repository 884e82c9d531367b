// Path: crates/crypto/src/sign/bls/mod.rs
//! BLS public-key handling for validator metadata.
//!
//! Validator key tuples carry a BLS12-381 public key (§3.1: `(bandersnatch,
//! ed25519, bls, metadata)`), but nothing in this specification's scope
//! (§1) verifies or produces a BLS signature over it — the field exists for
//! forward compatibility with the audit subsystem the graypaper reserves it
//! for. We therefore carry `jam_types::keys::BlsPublic` as opaque bytes and
//! do not implement BLS12-381 pairing arithmetic here; doing so would pull
//! in a dependency this crate has no verifier for.

use crate::error::CryptoError;
use jam_types::keys::BlsPublic;

/// Validate that a BLS public key tuple field is well-formed (correct
/// length, which the fixed-size wrapper already guarantees) without
/// attempting any pairing-based verification.
///
/// This is intentionally a no-op beyond the type system: real BLS
/// validation is out of scope here (see module docs).
pub fn check_well_formed(_key: &BlsPublic) -> Result<(), CryptoError> {
    Ok(())
}
