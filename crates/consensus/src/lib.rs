// Path: crates/consensus/src/lib.rs
//! # jam-consensus Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in
//! non-test code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # jam-consensus
//!
//! Safrole (spec §4.2): per-block ticket validation, the ticket
//! accumulator, epoch-boundary validator and entropy rotation, and the
//! block-production slot assignment (ring-VRF tickets with deterministic
//! fallback to validator-key ordering).

pub mod epoch;
pub mod ticket;

/// A prelude for easily importing the most common types.
pub mod prelude {
    pub use crate::epoch::{
        compute_epoch_slot_map, epoch_of, fallback_key_sequence, merge_tickets, rotate_epoch,
        rotate_validators, ValidatorSet,
    };
    pub use crate::ticket::{outside_in_order, validate_tickets_extrinsic, verify_ticket};
}
