// Path: crates/execution/src/block.rs
//! `apply(σ, B) → σ′` (spec §4.1): the twelve-step block orchestrator
//! wiring every other module in this crate into one atomic transition.

use jam_crypto::ring_vrf::RingVrf;
use jam_state::components::history::BlockInfo;
use jam_state::merklize::state_root;
use jam_state::sigma::Sigma;
use jam_state::transition::StateTransition;
use jam_types::block::Block;
use jam_types::config::Params;
use jam_types::error::StfError;
use jam_types::hash::Hash32;

use crate::accumulation::accumulate;
use crate::assurances::{apply_assurances, finalize_availability};
use crate::authorizations::apply_authorizations;
use crate::disputes::apply_disputes;
use crate::guarantees::{validate_guarantees_extrinsic, GuaranteeContext};
use crate::header::validate_header;
use crate::preimages::apply_preimages;
use jam_consensus::prelude::{
    epoch_of, merge_tickets, rotate_epoch, validate_tickets_extrinsic,
};

fn hash_bytes(bytes: &[u8]) -> Hash32 {
    Hash32(jam_crypto::algorithms::hash::blake2b_256(bytes))
}

fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(a.as_bytes());
    buf.extend_from_slice(b.as_bytes());
    hash_bytes(&buf)
}

fn header_hash(header: &jam_types::block::Header) -> Hash32 {
    hash_bytes(&parity_scale_codec::Encode::encode(header))
}

/// Applies `block` to `base`, returning the posterior σ′ or the first
/// error encountered (spec §4.1: "on failure the entire block is
/// rejected, no partial commit" — nothing is written back unless every
/// step succeeds).
pub fn apply(
    base: Sigma,
    block: &Block,
    params: &Params,
    ring: &impl RingVrf,
) -> Result<Sigma, StfError> {
    let mut t = StateTransition::new(base);

    // Step 1: header.
    let parent_slot = *t.ensure_tau()?;
    let kappa = t.ensure_kappa()?.clone();
    let entropy_output = validate_header(&block.header, parent_slot, &kappa, ring)?;

    // Step 2: append parent digest to β.
    let beta = t.ensure_beta_mut()?;
    let mut mmr = beta.entries.back().map(|e| e.mmr.clone()).unwrap_or_default();
    mmr.append(block.header.parent_hash, hash_pair);
    let reported_packages: Vec<Hash32> = block
        .extrinsic
        .guarantees
        .iter()
        .map(|g| g.report.package_spec.hash)
        .collect();
    beta.push(
        BlockInfo {
            header_hash: header_hash(&block.header),
            state_root: block.header.parent_state_root,
            mmr,
            reported_packages,
            slot: block.header.slot,
        },
        params.recent_history_size as usize,
    );

    // Step 3: Safrole (spec §4.2, implemented in `jam_consensus`).
    let eta3 = t.ensure_eta()?.eta3;
    let gamma_z = t.ensure_gamma()?.gamma_z;
    let submission_window_open = block.header.slot % params.epoch_length < params.ticket_submission_window;
    if submission_window_open {
        let new_tickets = validate_tickets_extrinsic(
            &block.extrinsic.tickets,
            gamma_z.as_bytes(),
            &eta3,
            params.max_ticket_attempts,
            params.epoch_length,
            ring,
        )?;
        let gamma = t.ensure_gamma_mut()?;
        merge_tickets(&mut gamma.gamma_a, &new_tickets, params.epoch_length)?;
    } else if !block.extrinsic.tickets.is_empty() {
        return Err(jam_types::error::SafroleError::UnexpectedTicket.into());
    }
    {
        let eta = t.ensure_eta_mut()?;
        eta.accumulate(block.header.entropy_source.as_bytes(), hash_bytes);
        let _ = entropy_output;
    }

    let crossed_epoch = epoch_of(parent_slot, params.epoch_length) != epoch_of(block.header.slot, params.epoch_length);
    if crossed_epoch {
        let mut entropy = t.ensure_eta()?.clone();
        let iota = t.ensure_iota()?.clone();
        let mut kappa = t.ensure_kappa()?.clone();
        let mut lambda = t.ensure_lambda()?.clone();
        let gamma = t.ensure_gamma_mut()?;
        rotate_epoch(gamma, &mut entropy, &iota, &mut kappa, &mut lambda, params.epoch_length, ring, hash_bytes)?;
        *t.ensure_eta_mut()? = entropy;
        *t.ensure_kappa_mut()? = kappa;
        *t.ensure_lambda_mut()? = lambda;
    }

    // Step 4: disputes.
    let validators_for_disputes = t.ensure_kappa()?.clone();
    let newly_bad = {
        let psi = t.ensure_psi_mut()?;
        apply_disputes(psi, &block.extrinsic.disputes, &validators_for_disputes, params.validators_super_majority)?
    };
    {
        let rho = t.ensure_rho_mut()?;
        for slot in rho.cores.iter_mut() {
            let is_bad = matches!(slot, Some(a) if newly_bad.contains(&a.report.package_spec.hash));
            if is_bad {
                *slot = None;
            }
        }
    }

    // Step 5: preimages.
    {
        let delta = t.ensure_delta_mut()?;
        apply_preimages(
            delta,
            &block.extrinsic.preimages,
            block.header.slot,
            params.max_preimage_request_age,
        )?;
    }

    // Step 6: authorizations.
    let authorized: Vec<crate::authorizations::AuthorizedThisBlock> = block
        .extrinsic
        .guarantees
        .iter()
        .map(|g| crate::authorizations::AuthorizedThisBlock {
            core: g.report.core_index,
            auth_hash: g.report.authorization_hash,
        })
        .collect();
    {
        let phi = t.ensure_phi()?.clone();
        let alpha = t.ensure_alpha_mut()?;
        apply_authorizations(
            alpha,
            &phi,
            &authorized,
            block.header.slot,
            params.core_count,
            params.max_authorizations_pool_items,
            params.max_authorizations_queue_items,
        )?;
    }

    // Step 7: guarantees.
    let accepted = {
        let validators = t.ensure_kappa()?.clone();
        let previous_validators = t.ensure_lambda()?.clone();
        let offenders = t.ensure_psi()?.offenders.clone();
        let recent_history = t.ensure_beta()?.clone();
        let accumulated_history = t.ensure_xi()?.clone();
        let delta = t.ensure_delta()?.clone();
        let entropy = t.ensure_eta()?.eta2;
        let ctx = GuaranteeContext {
            validators: &validators,
            previous_validators: &previous_validators,
            offenders: &offenders,
            recent_history: &recent_history,
            accumulated_history: &accumulated_history,
            delta: &delta,
            entropy,
            current_slot: block.header.slot,
            params,
        };
        validate_guarantees_extrinsic(&block.extrinsic.guarantees, &ctx, hash_bytes)?
    };
    {
        let pi = t.ensure_pi_mut()?;
        for g in &accepted {
            for validator_index in &g.assignment.guarantors {
                pi.record_guarantor(*validator_index);
            }
        }
    }
    {
        let rho = t.ensure_rho_mut()?;
        for g in accepted {
            if let Some(slot) = rho.cores.get_mut(g.core as usize) {
                *slot = Some(g.assignment);
            }
        }
    }

    // Step 8: assurances.
    let parent_hash = block.header.parent_hash;
    let validators_for_assurance = t.ensure_kappa()?.clone();
    let mut rho = t.ensure_rho()?.clone();
    let mut pi = t.ensure_pi()?.clone();
    let newly_available = apply_assurances(
        &mut rho,
        &block.extrinsic.assurances,
        &validators_for_assurance,
        parent_hash,
        params.avail_bitfield_bytes,
        params.validators_super_majority,
        &mut pi,
    )?;
    finalize_availability(&mut rho, block.header.slot, &mut pi);
    *t.ensure_rho_mut()? = rho;
    *t.ensure_pi_mut()? = pi;

    // Step 9: accumulation.
    let newly_accumulated = {
        let mut pending = t.ensure_theta()?.clone();
        let history = t.ensure_xi()?.clone();
        let mut delta = t.ensure_delta()?.clone();
        let mut stats = t.ensure_pi()?.clone();
        let accumulated = accumulate(
            newly_available,
            &mut pending,
            &history,
            &mut delta,
            block.header.slot,
            &mut stats,
        )?;
        *t.ensure_theta_mut()? = pending;
        *t.ensure_delta_mut()? = delta;
        *t.ensure_pi_mut()? = stats;
        accumulated
    };
    t.ensure_xi_mut()?.shift_and_append(newly_accumulated);

    // Step 10: validator statistics (guarantors and assurers already
    // folded in during steps 7-8; this records block authorship).
    t.ensure_pi_mut()?.record_author(block.header.author_index);

    // Step 11/12 are performed by the caller: it computes `state_root` over
    // `create_merged_view()`, compares it against the next block's declared
    // `parent_state_root`, then calls `commit()`. This function returns the
    // committed σ′ directly since there is no further mutation after commit.
    *t.ensure_tau_mut()? = block.header.slot;
    let merged = t.create_merged_view();
    let _ = state_root(&merged)?;

    Ok(t.commit())
}
