// Path: crates/crypto/src/algorithms/hash/mod.rs
//! Cryptographic hash functions.
//!
//! `Blake2b256Hash` is the hash used throughout merklization (§4.7) and the
//! entropy accumulator rotation (§4.2); it is not covered by `dcrypt`'s hash
//! module (SHA-2 only), so it is implemented directly against the `blake2`
//! crate, the same one the wider ecosystem (`paritytech/polkadot-sdk`) uses
//! for this exact purpose. SHA-256/512 via `dcrypt` are retained for
//! non-consensus utility hashing.

use crate::error::CryptoError;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use dcrypt::algorithms::hash::sha2::{Sha256 as DcryptSha256, Sha512 as DcryptSha512};
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

type Blake2b256 = Blake2b<U32>;

/// Hash function trait.
pub trait HashFunction {
    /// Hash a message and return the digest.
    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Get the digest size in bytes.
    fn digest_size(&self) -> usize;

    /// Get the name of the hash function.
    fn name(&self) -> &str;
}

/// Blake2b-256 hash function, the canonical hash of the state dictionary
/// and merkle trie (§4.7).
#[derive(Default, Clone)]
pub struct Blake2b256Hash;

impl HashFunction for Blake2b256Hash {
    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut hasher = Blake2b256::new();
        hasher.update(message);
        Ok(hasher.finalize().to_vec())
    }

    fn digest_size(&self) -> usize {
        32
    }

    fn name(&self) -> &str {
        "BLAKE2b-256"
    }
}

/// Hash `data` with Blake2b-256, returning a fixed-size digest.
pub fn blake2b_256<T: AsRef<[u8]>>(data: T) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data.as_ref());
    let out = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// SHA-256 hash function implementation using dcrypt.
#[derive(Default, Clone)]
pub struct Sha256Hash;

impl HashFunction for Sha256Hash {
    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = DcryptSha256::digest(message).map_err(dcrypt::Error::from)?;
        Ok(digest.to_bytes())
    }

    fn digest_size(&self) -> usize {
        32
    }

    fn name(&self) -> &str {
        "SHA-256"
    }
}

/// SHA-512 hash function implementation using dcrypt.
#[derive(Default, Clone)]
pub struct Sha512Hash;

impl HashFunction for Sha512Hash {
    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = DcryptSha512::digest(message).map_err(dcrypt::Error::from)?;
        Ok(digest.to_bytes())
    }

    fn digest_size(&self) -> usize {
        64
    }

    fn name(&self) -> &str {
        "SHA-512"
    }
}

/// Generic hasher that can use any hash function.
pub struct GenericHasher<H: HashFunction> {
    hash_function: H,
}

impl<H: HashFunction> GenericHasher<H> {
    /// Create a new hasher with the given hash function.
    pub fn new(hash_function: H) -> Self {
        Self { hash_function }
    }

    /// Hash a message.
    pub fn hash(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.hash_function.hash(message)
    }

    /// Get the digest size in bytes.
    pub fn digest_size(&self) -> usize {
        self.hash_function.digest_size()
    }

    /// Get the name of the hash function.
    pub fn name(&self) -> &str {
        self.hash_function.name()
    }
}

/// Create a SHA-256 hash of any type that can be referenced as bytes.
pub fn sha256<T: AsRef<[u8]>>(data: T) -> Result<[u8; 32], CryptoError> {
    let hasher = Sha256Hash;
    hasher
        .hash(data.as_ref())?
        .try_into()
        .map_err(|bytes: Vec<u8>| CryptoError::InvalidHashLength {
            expected: 32,
            got: bytes.len(),
        })
}

/// Create a SHA-512 hash of any type that can be referenced as bytes.
pub fn sha512<T: AsRef<[u8]>>(data: T) -> Result<[u8; 64], CryptoError> {
    let hasher = Sha512Hash;
    hasher
        .hash(data.as_ref())?
        .try_into()
        .map_err(|bytes: Vec<u8>| CryptoError::InvalidHashLength {
            expected: 64,
            got: bytes.len(),
        })
}

#[cfg(test)]
mod tests;
