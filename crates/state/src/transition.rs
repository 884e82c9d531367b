// Path: crates/state/src/transition.rs
//! `StateTransition`: the base/prime copy-on-write scaffold subsystems
//! operate through (spec §4.8).

use crate::sigma::Sigma;
use jam_types::error::StateError;

/// Wraps an immutable base σ and a mutable prime σ′ overlay whose
/// components are lazily cloned on first write.
///
/// Non-prime access (`ensure`) reads straight from the base and fails if
/// the component was never initialized. Prime access (`ensure_mut`)
/// deep-clones the base component into the prime overlay on first use;
/// subsequent accesses are cheap in-place mutations.
#[derive(Debug, Clone)]
pub struct StateTransition {
    base: Sigma,
    prime: Sigma,
}

/// Generates one `ensure_<field>`/`ensure_<field>_mut` pair per σ
/// component. `ensure_<field>` is a read-only accessor into the base
/// unless the field has already been primed, in which case the primed
/// value is authoritative (spec §4.8 describes only `ensure`/`ensure
/// (prime)`; exposing both an immutable accessor that prefers prime and a
/// mutable accessor is required so subsystems later in the same block see
/// earlier subsystems' writes).
macro_rules! field_accessors {
    ($field:ident, $ty:ty, $reader:ident, $writer:ident) => {
        /// Immutable access: the primed value if one exists, else the base
        /// value. Returns `ComponentUninitialized` if neither is set
        /// (spec §4.8: "panicking if the base component is uninitialized"
        /// — this crate's no-panic policy surfaces that as a typed error
        /// instead, which every caller already propagates with `?`).
        pub fn $reader(&self) -> Result<&$ty, StateError> {
            self.prime
                .$field
                .as_ref()
                .or(self.base.$field.as_ref())
                .ok_or(StateError::ComponentUninitialized(stringify!($field)))
        }

        /// Mutable access into the prime overlay, deep-cloning the base
        /// value into the prime slot on first use.
        pub fn $writer(&mut self) -> Result<&mut $ty, StateError> {
            if self.prime.$field.is_none() {
                let cloned = self
                    .base
                    .$field
                    .clone()
                    .ok_or(StateError::ComponentUninitialized(stringify!($field)))?;
                self.prime.$field = Some(cloned);
            }
            self.prime
                .$field
                .as_mut()
                .ok_or(StateError::ComponentUninitialized(stringify!($field)))
        }
    };
}

impl StateTransition {
    /// Begins a transition over `base`; the prime overlay starts empty.
    pub fn new(base: Sigma) -> Self {
        Self {
            base,
            prime: Sigma::empty(),
        }
    }

    field_accessors!(tau, u32, ensure_tau, ensure_tau_mut);
    field_accessors!(
        eta,
        crate::components::Entropy,
        ensure_eta,
        ensure_eta_mut
    );
    field_accessors!(
        kappa,
        crate::components::validators::ValidatorSet,
        ensure_kappa,
        ensure_kappa_mut
    );
    field_accessors!(
        lambda,
        crate::components::validators::ValidatorSet,
        ensure_lambda,
        ensure_lambda_mut
    );
    field_accessors!(
        iota,
        crate::components::validators::ValidatorSet,
        ensure_iota,
        ensure_iota_mut
    );
    field_accessors!(
        gamma,
        crate::components::SafroleState,
        ensure_gamma,
        ensure_gamma_mut
    );
    field_accessors!(
        alpha,
        crate::components::AuthPools,
        ensure_alpha,
        ensure_alpha_mut
    );
    field_accessors!(
        phi,
        crate::components::AuthQueues,
        ensure_phi,
        ensure_phi_mut
    );
    field_accessors!(
        beta,
        crate::components::RecentHistory,
        ensure_beta,
        ensure_beta_mut
    );
    field_accessors!(
        delta,
        crate::sigma::ServiceAccounts,
        ensure_delta,
        ensure_delta_mut
    );
    field_accessors!(
        rho,
        crate::components::Availability,
        ensure_rho,
        ensure_rho_mut
    );
    field_accessors!(
        theta,
        crate::components::PendingReports,
        ensure_theta,
        ensure_theta_mut
    );
    field_accessors!(
        xi,
        crate::components::AccumulatedHistory,
        ensure_xi,
        ensure_xi_mut
    );
    field_accessors!(
        chi,
        crate::components::Privileges,
        ensure_chi,
        ensure_chi_mut
    );
    field_accessors!(
        psi,
        crate::components::Disputes,
        ensure_psi,
        ensure_psi_mut
    );
    field_accessors!(
        pi,
        crate::components::Statistics,
        ensure_pi,
        ensure_pi_mut
    );

    /// `createMergedView()`: a σ-shaped snapshot with each field resolved
    /// to prime (if primed) else base, used for merklization and fork
    /// detection without committing (spec §4.8).
    pub fn create_merged_view(&self) -> Sigma {
        Sigma {
            tau: self.prime.tau.or(self.base.tau),
            eta: self.prime.eta.or(self.base.eta),
            kappa: self.prime.kappa.clone().or_else(|| self.base.kappa.clone()),
            lambda: self
                .prime
                .lambda
                .clone()
                .or_else(|| self.base.lambda.clone()),
            iota: self.prime.iota.clone().or_else(|| self.base.iota.clone()),
            gamma: self
                .prime
                .gamma
                .clone()
                .or_else(|| self.base.gamma.clone()),
            alpha: self
                .prime
                .alpha
                .clone()
                .or_else(|| self.base.alpha.clone()),
            phi: self.prime.phi.clone().or_else(|| self.base.phi.clone()),
            beta: self.prime.beta.clone().or_else(|| self.base.beta.clone()),
            delta: self
                .prime
                .delta
                .clone()
                .or_else(|| self.base.delta.clone()),
            rho: self.prime.rho.clone().or_else(|| self.base.rho.clone()),
            theta: self
                .prime
                .theta
                .clone()
                .or_else(|| self.base.theta.clone()),
            xi: self.prime.xi.clone().or_else(|| self.base.xi.clone()),
            chi: self.prime.chi.clone().or_else(|| self.base.chi.clone()),
            psi: self.prime.psi.clone().or_else(|| self.base.psi.clone()),
            pi: self.prime.pi.clone().or_else(|| self.base.pi.clone()),
        }
    }

    /// `commit()`: moves every primed field into the owning σ, consuming
    /// this transition. Per spec §8's idempotence law, a `StateTransition`
    /// must not be committed twice; consuming `self` enforces that at the
    /// type level.
    pub fn commit(mut self) -> Sigma {
        macro_rules! take_field {
            ($field:ident) => {
                if self.prime.$field.is_some() {
                    self.base.$field = self.prime.$field.take();
                }
            };
        }
        take_field!(tau);
        take_field!(eta);
        take_field!(kappa);
        take_field!(lambda);
        take_field!(iota);
        take_field!(gamma);
        take_field!(alpha);
        take_field!(phi);
        take_field!(beta);
        take_field!(delta);
        take_field!(rho);
        take_field!(theta);
        take_field!(xi);
        take_field!(chi);
        take_field!(psi);
        take_field!(pi);
        self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_fails_on_uninitialized_component() {
        let transition = StateTransition::new(Sigma::empty());
        assert!(matches!(
            transition.ensure_tau(),
            Err(StateError::ComponentUninitialized("tau"))
        ));
    }

    #[test]
    fn ensure_mut_clones_base_on_first_write() {
        let mut base = Sigma::empty();
        base.tau = Some(5);
        let mut transition = StateTransition::new(base);
        *transition.ensure_tau_mut().unwrap() += 1;
        assert_eq!(*transition.ensure_tau().unwrap(), 6);
        // Base is untouched until commit.
        assert_eq!(transition.base.tau, Some(5));
    }

    #[test]
    fn commit_moves_primed_fields_into_base() {
        let mut base = Sigma::empty();
        base.tau = Some(1);
        let mut transition = StateTransition::new(base);
        *transition.ensure_tau_mut().unwrap() = 2;
        let committed = transition.commit();
        assert_eq!(committed.tau, Some(2));
    }

    #[test]
    fn merged_view_prefers_prime_over_base() {
        let mut base = Sigma::empty();
        base.tau = Some(1);
        let mut transition = StateTransition::new(base);
        *transition.ensure_tau_mut().unwrap() = 9;
        let merged = transition.create_merged_view();
        assert_eq!(merged.tau, Some(9));
    }
}
