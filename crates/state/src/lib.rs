// Path: crates/state/src/lib.rs
//! # jam-state Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling. `indexing_slicing` is denied
//! crate-wide too; the handful of modules doing fixed-layout byte work
//! (`dictionary`, `trie`) carry their own narrow, justified
//! `#[allow(clippy::indexing_slicing)]` rather than relaxing the lint here.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # jam-state
//!
//! Typed global state (σ, spec §3.1), the service account model (spec
//! §3.2), the merklized 31-byte-keyed state dictionary and binary trie
//! (spec §4.7), and the `StateTransition` base/prime scaffold subsystems
//! mutate σ through (spec §4.8).

pub mod account;
pub mod components;
pub mod dictionary;
pub mod merklize;
pub mod sigma;
pub mod transition;
pub mod trie;

/// A prelude for easily importing the most common types.
pub mod prelude {
    pub use crate::account::{FootprintCost, ServiceAccount, StorageEntry, WriteOutcome};
    pub use crate::components::{
        AccumulatedHistory, AuthPools, AuthQueues, Availability, AvailabilityAssignment,
        Disputes, Entropy, Mmr, PendingReports, Privileges, RecentHistory, SafroleState,
        Statistics,
    };
    pub use crate::dictionary::{
        detect_key_type, reconstruct_entry_hash, service_base_key, service_entry_key,
        ComponentTag, DictKey, HashFragment, KeyKind,
    };
    pub use crate::merklize::{encode_sigma, reconstruct_sigma, state_root};
    pub use crate::sigma::{ServiceAccounts, Sigma};
    pub use crate::transition::StateTransition;
    pub use crate::trie::{merkle_root, Dictionary};
}
