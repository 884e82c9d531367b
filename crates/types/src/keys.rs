// Path: crates/types/src/keys.rs
//! Public-key newtypes shared by validator sets (κ, λ, ι) and Safrole.
//!
//! These are opaque byte wrappers, not cryptographic objects: `jam_crypto`
//! owns the algorithms that operate on the bytes. Keeping the wrapper types
//! here (rather than in `jam_crypto`) lets every crate that only needs to
//! *store* or *compare* keys avoid depending on the crypto crate.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! fixed_bytes_key {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// The all-zero key, used for padding and fallback derivations.
            pub const ZERO: $name = $name([0u8; $len]);

            /// Borrow the underlying bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::ZERO
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                $name(value)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_bytes_key!(BandersnatchPublic, 32, "A bandersnatch ring-VRF public key.");
fixed_bytes_key!(Ed25519Public, 32, "An Ed25519 verification key.");
fixed_bytes_key!(BlsPublic, 144, "A BLS12-381 public key (compressed G2 point).");
fixed_bytes_key!(ValidatorMetadata, 128, "Opaque validator metadata (e.g. network address).");
fixed_bytes_key!(Ed25519SignatureBytes, 64, "A raw Ed25519 signature.");
fixed_bytes_key!(BandersnatchSeal, 96, "A bandersnatch block seal or entropy-source signature.");

/// The tuple of public keys and metadata identifying one validator across
/// κ (active), λ (previous) and ι (pending) sets.
#[derive(Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct ValidatorKey {
    /// Ring-VRF key used for Safrole ticket sealing and block seals.
    pub bandersnatch: BandersnatchPublic,
    /// Signing key used for guarantee, assurance and judgment signatures.
    pub ed25519: Ed25519Public,
    /// Aggregatable key reserved for future use by the audit subsystem.
    pub bls: BlsPublic,
    /// Opaque per-validator metadata (not consensus-interpreted).
    pub metadata: ValidatorMetadata,
}

impl ValidatorKey {
    /// A zeroed-out validator key, used to pad short validator sets in tests.
    pub const ZERO: ValidatorKey = ValidatorKey {
        bandersnatch: BandersnatchPublic::ZERO,
        ed25519: Ed25519Public::ZERO,
        bls: BlsPublic::ZERO,
        metadata: ValidatorMetadata::ZERO,
    };
}

/// A 0-based index into the active validator set `0..V`.
pub type ValidatorIndex = u16;

/// A 0-based index into the core set `0..C`.
pub type CoreIndex = u16;

/// A service account identifier.
pub type ServiceId = u32;

/// A timeslot index (τ), strictly increasing across blocks.
pub type TimeSlot = u32;
