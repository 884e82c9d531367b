// Path: crates/crypto/src/sign/mod.rs
//! Signature algorithm traits shared by every concrete scheme in this
//! module. Kept local to this crate (the teacher's equivalents lived in a
//! separate `ioi-api` crate this workspace does not carry).

use crate::error::CryptoError;

/// A type that can be serialized to and parsed from its canonical bytes.
pub trait SerializableKey: Sized {
    /// Serialize to the canonical byte representation.
    fn to_bytes(&self) -> Vec<u8>;
    /// Parse from the canonical byte representation.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError>;
}

/// Marker trait for a scheme's signature type.
pub trait Signature: SerializableKey {}

/// A private key capable of signing messages.
pub trait SigningKey: SerializableKey {
    /// The signature type this key produces.
    type Signature: Signature;
    /// Sign `message`, producing a `Self::Signature`.
    fn sign(&self, message: &[u8]) -> Result<Self::Signature, CryptoError>;
}

/// A public key capable of verifying signatures.
pub trait VerifyingKey: SerializableKey {
    /// The signature type this key verifies.
    type Signature: Signature;
    /// Verify `signature` over `message`, failing with `CryptoError::VerificationFailed`
    /// (or a more specific variant) on mismatch.
    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError>;
}

/// A public/private key pair for one signature scheme.
pub trait SigningKeyPair {
    /// The public half.
    type PublicKey: VerifyingKey<Signature = Self::Signature>;
    /// The private half.
    type PrivateKey: SigningKey<Signature = Self::Signature>;
    /// The signature type produced and verified by this scheme.
    type Signature: Signature;

    /// Borrow out the public key.
    fn public_key(&self) -> Self::PublicKey;
    /// Borrow out the private key.
    fn private_key(&self) -> Self::PrivateKey;
    /// Sign `message` with the private half.
    fn sign(&self, message: &[u8]) -> Result<Self::Signature, CryptoError>;
}

pub mod bls;
pub mod eddsa;
