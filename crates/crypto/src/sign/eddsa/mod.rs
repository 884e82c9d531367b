// Path: crates/crypto/src/sign/eddsa/mod.rs
//! Ed25519 signing and verification using dcrypt.

use crate::error::CryptoError;
use crate::sign::{SerializableKey, Signature, SigningKey, SigningKeyPair, VerifyingKey};
use dcrypt::api::Signature as SignatureTrait;
use rand::rngs::OsRng;

use dcrypt::sign::eddsa;

/// Ed25519 key pair implementation.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    /// Public verification key.
    public_key: eddsa::Ed25519PublicKey,
    /// Private signing key.
    secret_key: eddsa::Ed25519SecretKey,
}

/// Ed25519 signature implementation.
pub struct Ed25519Signature(eddsa::Ed25519Signature);

/// Ed25519 public key implementation.
pub struct Ed25519PublicKey(eddsa::Ed25519PublicKey);

/// Ed25519 private key implementation.
pub struct Ed25519PrivateKey(eddsa::Ed25519SecretKey);

impl Ed25519KeyPair {
    /// Generate a new Ed25519 key pair.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = OsRng;
        let (public_key, secret_key) =
            eddsa::Ed25519::keypair(&mut rng).map_err(CryptoError::from)?;
        Ok(Self {
            public_key,
            secret_key,
        })
    }

    /// Create from an existing private key.
    pub fn from_private_key(private_key: &Ed25519PrivateKey) -> Result<Self, CryptoError> {
        let secret_key = private_key.0.clone();
        let public_key = secret_key.public_key().map_err(CryptoError::from)?;
        Ok(Self {
            public_key,
            secret_key,
        })
    }
}

impl SigningKeyPair for Ed25519KeyPair {
    type PublicKey = Ed25519PublicKey;
    type PrivateKey = Ed25519PrivateKey;
    type Signature = Ed25519Signature;

    fn public_key(&self) -> Self::PublicKey {
        Ed25519PublicKey(self.public_key.clone())
    }

    fn private_key(&self) -> Self::PrivateKey {
        Ed25519PrivateKey(self.secret_key.clone())
    }

    fn sign(&self, message: &[u8]) -> Result<Self::Signature, CryptoError> {
        let signature = eddsa::Ed25519::sign(message, &self.secret_key)?;
        Ok(Ed25519Signature(signature))
    }
}

impl VerifyingKey for Ed25519PublicKey {
    type Signature = Ed25519Signature;

    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError> {
        eddsa::Ed25519::verify(message, &signature.0, &self.0).map_err(CryptoError::from)
    }
}

impl SerializableKey for Ed25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        eddsa::Ed25519PublicKey::from_bytes(bytes)
            .map(Ed25519PublicKey)
            .map_err(|e| CryptoError::InvalidKey(format!("failed to parse public key: {:?}", e)))
    }
}

impl SigningKey for Ed25519PrivateKey {
    type Signature = Ed25519Signature;

    fn sign(&self, message: &[u8]) -> Result<Self::Signature, CryptoError> {
        let signature = eddsa::Ed25519::sign(message, &self.0)?;
        Ok(Ed25519Signature(signature))
    }
}

impl SerializableKey for Ed25519PrivateKey {
    fn to_bytes(&self) -> Vec<u8> {
        // Export just the seed (32 bytes).
        self.0.seed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(
                "invalid private key length: expected 32 bytes".to_string(),
            ));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        eddsa::Ed25519SecretKey::from_seed(&seed)
            .map(Ed25519PrivateKey)
            .map_err(|e| {
                CryptoError::InvalidKey(format!("failed to create secret key from seed: {:?}", e))
            })
    }
}

impl SerializableKey for Ed25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        eddsa::Ed25519Signature::from_bytes(bytes)
            .map(Ed25519Signature)
            .map_err(|e| CryptoError::InvalidSignature(format!("failed to parse signature: {:?}", e)))
    }
}

impl Signature for Ed25519Signature {}

impl Ed25519Signature {
    /// Convert to the fixed-size wire type stored in guarantee/assurance/
    /// judgment signatures.
    pub fn to_wire(&self) -> Result<jam_types::keys::Ed25519SignatureBytes, CryptoError> {
        let bytes = self.to_bytes();
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidHashLength { expected: 64, got: v.len() })?;
        Ok(jam_types::keys::Ed25519SignatureBytes(arr))
    }

    /// Parse from the fixed-size wire type.
    pub fn from_wire(wire: &jam_types::keys::Ed25519SignatureBytes) -> Result<Self, CryptoError> {
        Self::from_bytes(wire.as_bytes())
    }
}

impl Ed25519PublicKey {
    /// Convert to the fixed-size wire type stored in validator key tuples.
    pub fn to_wire(&self) -> Result<jam_types::keys::Ed25519Public, CryptoError> {
        let bytes = self.to_bytes();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidHashLength { expected: 32, got: v.len() })?;
        Ok(jam_types::keys::Ed25519Public(arr))
    }

    /// Parse from the fixed-size wire type.
    pub fn from_wire(wire: &jam_types::keys::Ed25519Public) -> Result<Self, CryptoError> {
        Self::from_bytes(wire.as_bytes())
    }
}

#[cfg(test)]
mod tests;
