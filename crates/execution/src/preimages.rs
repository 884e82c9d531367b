// Path: crates/execution/src/preimages.rs
//! Preimage extrinsic integration into δ (spec §4.1 step 5): ordered and
//! deduplicated by `(requester, blob)`.

use jam_crypto::algorithms::hash::blake2b_256;
use jam_state::sigma::ServiceAccounts;
use jam_types::block::PreimageExtrinsicEntry;
use jam_types::error::PreimageError;
use jam_types::hash::Hash32;

fn blob_key(blob: &[u8]) -> Hash32 {
    Hash32(blake2b_256(blob))
}

/// Integrates one block's preimages extrinsic into `delta` (spec §4.1 step
/// 5). Entries must already be ordered strictly by `(requester, blob_hash)`
/// with no duplicate pair; each requester must exist in δ and must carry an
/// open solicitation (`ServiceAccount::solicit_preimage`) for the blob's
/// hash recorded no more than `max_request_age` slots before `current_slot`,
/// else the entry is rejected.
pub fn apply_preimages(
    delta: &mut ServiceAccounts,
    entries: &[PreimageExtrinsicEntry],
    current_slot: u32,
    max_request_age: u32,
) -> Result<(), PreimageError> {
    let mut previous: Option<(u32, Hash32)> = None;
    for entry in entries {
        let hash = blob_key(&entry.blob);
        if let Some((prev_requester, prev_hash)) = previous {
            let key = (entry.requester, hash);
            if key == (prev_requester, prev_hash) {
                return Err(PreimageError::DuplicatePreimage {
                    requester: entry.requester,
                });
            }
            if key < (prev_requester, prev_hash) {
                return Err(PreimageError::PreimagesNotOrdered);
            }
        }
        previous = Some((entry.requester, hash));

        let account = delta
            .get_mut(&entry.requester)
            .ok_or(PreimageError::UnknownServiceAccount(entry.requester))?;
        match account.storage.get(&hash) {
            Some(existing) if existing.0.is_empty() => {
                let requested_at = account
                    .preimage_requests
                    .get(&hash)
                    .copied()
                    .ok_or(PreimageError::PreimageUnneeded(entry.requester))?;
                let age = current_slot.saturating_sub(requested_at);
                if age > max_request_age {
                    return Err(PreimageError::SolicitationExpired {
                        requester: entry.requester,
                        age,
                    });
                }
                account
                    .storage
                    .insert(hash, jam_state::account::StorageEntry(entry.blob.clone()));
                account.preimage_requests.remove(&hash);
            }
            Some(_) => {
                return Err(PreimageError::DuplicatePreimage {
                    requester: entry.requester,
                });
            }
            None => return Err(PreimageError::PreimageUnneeded(entry.requester)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_state::account::ServiceAccount;

    const MAX_AGE: u32 = 100;

    fn account_with_solicitation(hash: Hash32, requested_at: u32) -> ServiceAccount {
        let mut account = ServiceAccount::new(Hash32::ZERO, 1_000_000, 0, 0, 0, 0);
        account.solicit_preimage(hash, requested_at);
        account
    }

    #[test]
    fn integrates_solicited_preimage() {
        let blob = b"hello".to_vec();
        let hash = blob_key(&blob);
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_solicitation(hash, 5));

        apply_preimages(
            &mut delta,
            &[PreimageExtrinsicEntry { requester: 1, blob: blob.clone() }],
            10,
            MAX_AGE,
        )
        .unwrap();

        assert_eq!(delta.get(&1).unwrap().storage.get(&hash).unwrap().0, blob);
        assert!(delta.get(&1).unwrap().preimage_requests.get(&hash).is_none());
    }

    #[test]
    fn unsolicited_preimage_is_rejected() {
        let mut delta = ServiceAccounts::new();
        delta.insert(1, ServiceAccount::new(Hash32::ZERO, 1_000_000, 0, 0, 0, 0));
        let result = apply_preimages(
            &mut delta,
            &[PreimageExtrinsicEntry { requester: 1, blob: b"x".to_vec() }],
            10,
            MAX_AGE,
        );
        assert_eq!(result, Err(PreimageError::PreimageUnneeded(1)));
    }

    #[test]
    fn expired_solicitation_is_rejected() {
        let blob = b"hello".to_vec();
        let hash = blob_key(&blob);
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_solicitation(hash, 0));

        let result = apply_preimages(
            &mut delta,
            &[PreimageExtrinsicEntry { requester: 1, blob }],
            MAX_AGE + 1,
            MAX_AGE,
        );
        assert_eq!(
            result,
            Err(PreimageError::SolicitationExpired { requester: 1, age: MAX_AGE + 1 })
        );
    }

    #[test]
    fn unknown_service_is_rejected() {
        let mut delta = ServiceAccounts::new();
        let result = apply_preimages(
            &mut delta,
            &[PreimageExtrinsicEntry { requester: 9, blob: b"x".to_vec() }],
            10,
            MAX_AGE,
        );
        assert_eq!(result, Err(PreimageError::UnknownServiceAccount(9)));
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let blob = b"hello".to_vec();
        let hash = blob_key(&blob);
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_solicitation(hash, 5));
        let entries = vec![
            PreimageExtrinsicEntry { requester: 1, blob: blob.clone() },
            PreimageExtrinsicEntry { requester: 1, blob },
        ];
        assert_eq!(
            apply_preimages(&mut delta, &entries, 10, MAX_AGE),
            Err(PreimageError::DuplicatePreimage { requester: 1 })
        );
    }
}
