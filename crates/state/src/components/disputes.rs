// Path: crates/state/src/components/disputes.rs
//! ψ: dispute-judgment sets (spec §3.1, §4.1 step 4).

use jam_types::hash::Hash32;
use jam_types::keys::Ed25519Public;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// ψ: pairwise-disjoint sets of report hashes judged good/bad/wonky, plus
/// the set of offending validator keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Disputes {
    pub good: BTreeSet<Hash32>,
    pub bad: BTreeSet<Hash32>,
    pub wonky: BTreeSet<Hash32>,
    pub offenders: BTreeSet<Ed25519Public>,
}

impl Disputes {
    /// Verifies the pairwise-disjoint invariant (spec §3.1).
    pub fn is_partitioned(&self) -> bool {
        self.good.is_disjoint(&self.bad)
            && self.good.is_disjoint(&self.wonky)
            && self.bad.is_disjoint(&self.wonky)
    }

    pub fn is_bad(&self, report_hash: &Hash32) -> bool {
        self.bad.contains(report_hash)
    }
}
