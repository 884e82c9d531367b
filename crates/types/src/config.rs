// Path: crates/types/src/config.rs
//! Runtime configuration record (§6, §9 "Comptime parameterization").
//!
//! The source parameterizes types by these constants at compile time; this
//! reimplementation treats them as a plain runtime record so every subsystem
//! takes `&Params` instead of hardcoding TINY/FULL-specific constants. All
//! bounds described in §3/§4 are runtime checks against this record.

use serde::{Deserialize, Serialize};

/// Protocol configuration shared by every subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Number of validators, V.
    pub validators_count: u16,
    /// Epoch length in slots, E.
    pub epoch_length: u32,
    /// Number of cores, C.
    pub core_count: u16,
    /// Maximum entries retained per-core in the authorization pool α, O.
    pub max_authorizations_pool_items: u16,
    /// Fixed length of the per-core authorization queue φ, Q.
    pub max_authorizations_queue_items: u16,
    /// Bounded length of recent history β, H.
    pub recent_history_size: u16,
    /// Length in bytes of an assurance bitfield.
    pub avail_bitfield_bytes: u16,
    /// Maximum total `accumulate_gas` a single work report may request.
    pub gas_alloc_accumulation: u64,
    /// Minimum signature count for the availability supermajority,
    /// `⌈2V/3⌉+1`. Derived from `validators_count` but stored explicitly so
    /// callers never recompute it inconsistently.
    pub validators_super_majority: u16,
    /// Number of slots during which ticket submission is accepted.
    pub ticket_submission_window: u32,
    /// Period, in slots, of the guarantor-assignment rotation shift R.
    pub rotation_period: u32,
    /// Number of slots a guaranteed-but-unavailable report is retained
    /// before timing out, T.
    pub report_timeout: u32,
    /// Maximum permitted value of a ticket's `attempt` field, N.
    pub max_ticket_attempts: u8,
    /// Maximum age, in slots, a `lookup_anchor` may have relative to τ.
    pub max_lookup_anchor_age: u32,
    /// Maximum age, in slots, a preimage solicitation may have before its
    /// matching preimages-extrinsic entry is no longer accepted.
    pub max_preimage_request_age: u32,
}

fn super_majority(validators_count: u16) -> u16 {
    (2 * validators_count as u32 / 3 + 1) as u16
}

impl Params {
    /// The TINY preset used by conformance test vectors: V=6, C=2, E=12.
    pub fn tiny() -> Self {
        let validators_count = 6;
        Params {
            validators_count,
            epoch_length: 12,
            core_count: 2,
            max_authorizations_pool_items: 8,
            max_authorizations_queue_items: 80,
            recent_history_size: 8,
            avail_bitfield_bytes: 1,
            gas_alloc_accumulation: 10_000_000,
            validators_super_majority: super_majority(validators_count),
            ticket_submission_window: 10,
            rotation_period: 4,
            report_timeout: 5,
            max_ticket_attempts: 3,
            max_lookup_anchor_age: 14_400,
            max_preimage_request_age: 14_400,
        }
    }

    /// The FULL preset: V=1023, C=341, E=600.
    pub fn full() -> Self {
        let validators_count = 1023;
        Params {
            validators_count,
            epoch_length: 600,
            core_count: 341,
            max_authorizations_pool_items: 8,
            max_authorizations_queue_items: 80,
            recent_history_size: 8,
            avail_bitfield_bytes: 43,
            gas_alloc_accumulation: 10_000_000,
            validators_super_majority: super_majority(validators_count),
            ticket_submission_window: 500,
            rotation_period: 10,
            report_timeout: 5,
            max_ticket_attempts: 3,
            max_lookup_anchor_age: 14_400,
            max_preimage_request_age: 14_400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_super_majority_is_five() {
        // ceil(2*6/3) + 1 = 4 + 1 = 5
        assert_eq!(Params::tiny().validators_super_majority, 5);
    }

    #[test]
    fn full_super_majority_is_six_eighty_three() {
        // floor(2*1023/3) + 1 = 682 + 1 = 683
        assert_eq!(Params::full().validators_super_majority, 683);
    }

    #[test]
    fn toml_roundtrip() {
        let params = Params::tiny();
        let s = toml::to_string(&params).unwrap();
        let back: Params = toml::from_str(&s).unwrap();
        assert_eq!(params, back);
    }
}
