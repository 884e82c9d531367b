// Path: crates/crypto/src/lib.rs
//! # JAM STF Crypto
//!
//! Cryptographic primitives for the state transition function: Blake2b-256
//! hashing, Ed25519 signing/verification, BLS public-key handling (opaque,
//! see `sign::bls`), and the ring-VRF interface Safrole ticket sealing is
//! specified against.
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Hash function implementations (Blake2b-256, SHA-2 via `dcrypt`).
pub mod algorithms;
/// Local error re-export from `jam_types`.
pub mod error;
/// The ring-VRF trait interface and a deterministic test double.
pub mod ring_vrf;
/// Signature scheme implementations (Ed25519, BLS key handling).
pub mod sign;

#[cfg(test)]
mod tests {
    #[test]
    fn test_crypto_canary() {}
}
