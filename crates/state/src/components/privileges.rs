// Path: crates/state/src/components/privileges.rs
//! χ: privileged-service designations (spec §3.1).

use jam_types::keys::ServiceId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// χ: the manager service, per-core assignment, the designate service, and
/// the always-accumulate gas table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Privileges {
    /// Service permitted to update χ itself.
    pub manager: ServiceId,
    /// Per-core service assignment (which service owns authorization for
    /// a core).
    pub assign: Vec<ServiceId>,
    /// Service permitted to designate the next validator set.
    pub designate: ServiceId,
    /// Services accumulated every block regardless of work reports, with
    /// their guaranteed gas budget.
    pub always_accumulate: BTreeMap<ServiceId, u64>,
}
