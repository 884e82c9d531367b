// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]

//! # JAM STF Types
//!
//! Core data structures, the `Params` configuration record, the typed error
//! taxonomy, and the canonical binary codec shared by every crate in this
//! workspace.
//!
//! ## Architectural role
//!
//! As the base crate, `jam-types` has minimal dependencies and is itself a
//! dependency for almost every other crate in the workspace. This prevents
//! circular dependencies and provides a stable, canonical definition for
//! the wire-level `Block`/`Header`/extrinsic types, `WorkReport`, validator
//! keys, and the subsystem error enums every crate propagates through `?`.

/// Block header, extrinsic bundle and its substructures (§6).
pub mod block;
/// The canonical, deterministic binary codec for consensus-critical state.
pub mod codec;
/// The `Params` configuration record (§6, §9).
pub mod config;
/// The typed error taxonomy (§7).
pub mod error;
/// The 32-byte digest type shared by hashing and merklization.
pub mod hash;
/// Validator key tuples and small index/id type aliases.
pub mod keys;
/// A prelude re-exporting the types most crates need.
pub mod prelude;
/// Work reports and their dependency bookkeeping (§3.3).
pub mod report;
/// Safrole ticket wire and canonical forms (§4.2).
pub mod ticket;

/// A top-level, crate-wide `Result` type alias with the aggregate STF error.
pub type Result<T, E = crate::error::StfError> = std::result::Result<T, E>;
