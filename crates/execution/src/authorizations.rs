// Path: crates/execution/src/authorizations.rs
//! α, φ processing (spec §4.1 step 6): remove authorized entries from the
//! pool, then rotate the queue's current slot in.

use jam_state::components::authorizations::{AuthPools, AuthQueues};
use jam_types::error::AuthorizationError;
use jam_types::hash::Hash32;

/// One core's `(authorizer_hash, requested_by_this_block)` pair, derived
/// from the guarantees already validated this block (spec §4.1: "remove
/// authorized (core, auth_hash) from α's pool if present").
pub struct AuthorizedThisBlock {
    pub core: u16,
    pub auth_hash: Hash32,
}

/// Applies one block's authorization step: each guaranteed report's
/// `authorization_hash` is removed from its core's pool if present (a
/// miss is not an error — spec §9's `processInputAuthorizers` note: missing
/// authorizers are silently ignored), then every core's queue entry for
/// `slot mod Q` rotates into the pool, FIFO-evicting the oldest entry when
/// the pool is already full.
pub fn apply_authorizations(
    pools: &mut AuthPools,
    queues: &AuthQueues,
    authorized: &[AuthorizedThisBlock],
    slot: u32,
    core_count: u16,
    max_pool_items: u16,
    queue_len: u16,
) -> Result<(), AuthorizationError> {
    for entry in authorized {
        if entry.core >= core_count {
            return Err(AuthorizationError::InvalidCore { core: entry.core });
        }
        if !pools.remove(entry.core as usize, &entry.auth_hash) {
            tracing::debug!(core = entry.core, "authorization hash not found in pool, ignoring");
        }
    }

    let slot_index = (slot % queue_len.max(1) as u32) as usize;
    for core in 0..core_count {
        if let Some(hash) = queues.slot_entry(core as usize, slot_index) {
            pools.rotate_in(core as usize, hash, max_pool_items as usize);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_authorized_hash_before_rotating() {
        let mut pools = AuthPools::new(1);
        pools.rotate_in(0, Hash32([1; 32]), 3);
        let mut queues = AuthQueues::new(1, 4);
        queues.queues[0][0] = Hash32([9; 32]);

        apply_authorizations(
            &mut pools,
            &queues,
            &[AuthorizedThisBlock { core: 0, auth_hash: Hash32([1; 32]) }],
            0,
            1,
            3,
            4,
        )
        .unwrap();

        assert_eq!(pools.pools[0].len(), 1);
        assert_eq!(pools.pools[0][0], Hash32([9; 32]));
    }

    #[test]
    fn missing_authorizer_is_silently_ignored() {
        let mut pools = AuthPools::new(1);
        let queues = AuthQueues::new(1, 4);
        let result = apply_authorizations(
            &mut pools,
            &queues,
            &[AuthorizedThisBlock { core: 0, auth_hash: Hash32([7; 32]) }],
            0,
            1,
            3,
            4,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn invalid_core_is_rejected() {
        let mut pools = AuthPools::new(1);
        let queues = AuthQueues::new(1, 4);
        let result = apply_authorizations(
            &mut pools,
            &queues,
            &[AuthorizedThisBlock { core: 5, auth_hash: Hash32::ZERO }],
            0,
            1,
            3,
            4,
        );
        assert_eq!(result, Err(AuthorizationError::InvalidCore { core: 5 }));
    }
}
