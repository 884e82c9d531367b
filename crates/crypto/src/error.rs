// Path: crates/crypto/src/error.rs
//! Local error types for the `jam-crypto` crate.

// Re-export the canonical error type from the base types crate, matching
// the teacher's pattern of centralizing error enums in the foundational
// crate and re-exporting them where they're used.
pub use jam_types::error::CryptoError;
