// Path: crates/state/src/sigma.rs
//! σ: the independently-typed global state record (spec §3.1).
//!
//! Every field is `None` until initialized (spec §3.1: "Each is `None`
//! until initialized"). `StateTransition` (see `transition.rs`) is the only
//! thing that mutates a `Sigma`; application code never writes through it
//! directly.

use crate::account::ServiceAccount;
use crate::components::{
    AccumulatedHistory, Availability, Disputes, Entropy, PendingReports, Privileges,
    RecentHistory, SafroleState, Statistics,
};
use crate::components::authorizations::{AuthPools, AuthQueues};
use crate::components::validators::ValidatorSet;
use jam_types::keys::{ServiceId, TimeSlot};
use std::collections::BTreeMap;

/// `δ`: service id → account mapping.
pub type ServiceAccounts = BTreeMap<ServiceId, ServiceAccount>;

/// σ, component by component. Field names follow the graypaper symbols
/// spelled out (spec §3.1's table): `tau`=τ, `eta`=η, `kappa`=κ, `lambda`=λ,
/// `iota`=ι, `gamma`=γ, `alpha`=α, `phi`=φ, `beta`=β, `delta`=δ, `rho`=ρ,
/// `theta`=ϑ, `xi`=ξ, `chi`=χ, `psi`=ψ, `pi`=π.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sigma {
    pub tau: Option<TimeSlot>,
    pub eta: Option<Entropy>,
    pub kappa: Option<ValidatorSet>,
    pub lambda: Option<ValidatorSet>,
    pub iota: Option<ValidatorSet>,
    pub gamma: Option<SafroleState>,
    pub alpha: Option<AuthPools>,
    pub phi: Option<AuthQueues>,
    pub beta: Option<RecentHistory>,
    pub delta: Option<ServiceAccounts>,
    pub rho: Option<Availability>,
    pub theta: Option<PendingReports>,
    pub xi: Option<AccumulatedHistory>,
    pub chi: Option<Privileges>,
    pub psi: Option<Disputes>,
    pub pi: Option<Statistics>,
}

impl Sigma {
    pub fn empty() -> Self {
        Self::default()
    }
}
