use beacon_chain::test_utils::BeaconChainHarness;
use beacon_chain::{BeaconChainError, ChainConfig, DutiesError};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use store::ValidatorIndexStore;
use types::test_utils::interop_pubkey;
use types::*;

fn mainnet_harness(validator_count: usize) -> BeaconChainHarness<MainnetEthSpec> {
    BeaconChainHarness::builder(MainnetEthSpec)
        .default_spec()
        .validator_count(validator_count)
        .build()
}

fn minimal_harness(validator_count: usize) -> BeaconChainHarness<MinimalEthSpec> {
    BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .validator_count(validator_count)
        .build()
}

/// Mixes that differ from epoch to epoch, so that consecutive shufflings differ.
fn distinct_mix(i: usize) -> Hash256 {
    let mut bytes = [0; 32];
    bytes[..8].copy_from_slice(&(i as u64 + 1).to_le_bytes());
    Hash256::from(bytes)
}

#[test]
fn duties_are_returned_in_request_order() {
    let harness = mainnet_harness(64);

    let response = harness.get_duties(&[0, 1], Epoch::new(0)).unwrap();
    assert_eq!(response.epoch, Epoch::new(0));
    assert_eq!(response.dependent_root, Hash256::ZERO);
    assert_eq!(response.duties.len(), 2);

    let (first, second) = (&response.duties[0], &response.duties[1]);
    assert_eq!(first.validator_index, 0);
    assert_eq!(first.pubkey, interop_pubkey(0));
    assert_eq!(second.validator_index, 1);
    assert_eq!(second.pubkey, interop_pubkey(1));

    // Attester slots are decided by the shuffle, not by validator index.
    assert_eq!(first.attester_slot, Some(Slot::new(21)));
    assert_eq!(second.attester_slot, Some(Slot::new(0)));
    assert_eq!(first.committee_index, Some(0));
    assert_eq!(second.committee_index, Some(0));

    // The reverse request reverses the response.
    let reversed = harness.get_duties(&[1, 0], Epoch::new(0)).unwrap();
    assert_eq!(reversed.duties[0], response.duties[1]);
    assert_eq!(reversed.duties[1], response.duties[0]);
}

#[test]
fn duty_fields_are_consistent() {
    let harness = mainnet_harness(64);
    let state = harness.head_state();

    let response = harness
        .get_duties(&(0..64).collect::<Vec<_>>(), Epoch::new(0))
        .unwrap();

    for duty in &response.duties {
        assert_eq!(duty.status, ValidatorStatus::Active);
        assert_eq!(duty.committees_at_slot, 1);
        // 64 validators over 32 committees.
        assert_eq!(duty.committee.len(), 2);

        let position = duty.committee_position.unwrap();
        assert_eq!(duty.committee[position], duty.validator_index);

        // Committees this small always aggregate.
        assert!(duty.is_aggregator);
        assert_eq!(
            state.is_aggregator(
                duty.attester_slot.unwrap(),
                duty.validator_index as usize,
                duty.committee.len(),
                &harness.spec
            ),
            Ok(true)
        );
    }
}

#[test]
fn proposer_slots_match_proposer_duties() {
    let harness = mainnet_harness(64);
    let epoch = Epoch::new(0);

    let (dependent_root, proposers) = harness.chain.proposer_duties(epoch).unwrap();
    assert_eq!(dependent_root, Hash256::ZERO);
    assert_eq!(
        proposers
            .iter()
            .map(|duty| duty.validator_index)
            .collect::<Vec<_>>(),
        vec![
            1, 42, 7, 60, 3, 25, 12, 6, 51, 13, 42, 38, 38, 62, 30, 25, 50, 61, 19, 26, 35, 45, 2,
            41, 10, 53, 7, 20, 46, 14, 18, 60
        ]
    );
    for (slot, duty) in epoch.slot_iter(32).zip(&proposers) {
        assert_eq!(duty.slot, slot);
        assert_eq!(duty.pubkey, interop_pubkey(duty.validator_index as usize));
    }

    let response = harness.get_duties(&[42, 0, 1], epoch).unwrap();
    assert_eq!(
        response.duties[0].proposer_slots,
        vec![Slot::new(1), Slot::new(10)]
    );
    assert_eq!(response.duties[0].attester_slot, Some(Slot::new(4)));
    assert!(response.duties[1].proposer_slots.is_empty());
    assert_eq!(response.duties[2].proposer_slots, vec![Slot::new(0)]);
}

#[test]
fn ten_validators_attest_within_the_epoch() {
    let harness = mainnet_harness(10);
    let current_slot = harness.head_state().slot;

    let response = harness.get_duties(&[0], Epoch::new(0)).unwrap();
    let attester_slot = response.duties[0].attester_slot.unwrap();

    assert!(attester_slot <= current_slot + MainnetEthSpec::slots_per_epoch());
    assert_eq!(attester_slot, Slot::new(8));
    assert_eq!(response.duties[0].committee_position, Some(0));
    assert_eq!(response.duties[0].committee, vec![0]);
}

#[test]
fn known_minimal_attester_slots() {
    let harness = minimal_harness(16);

    let response = harness
        .get_duties(&(0..16).collect::<Vec<_>>(), Epoch::new(0))
        .unwrap();
    let slots = response
        .duties
        .iter()
        .map(|duty| duty.attester_slot.unwrap().as_u64())
        .collect::<Vec<_>>();

    assert_eq!(slots, vec![0, 1, 6, 7, 5, 2, 2, 6, 4, 4, 5, 7, 3, 3, 0, 1]);
}

#[test]
fn mid_epoch_head_serves_current_and_next_epoch() {
    let harness = BeaconChainHarness::builder(MainnetEthSpec)
        .default_spec()
        .validator_count(64)
        .head_slot(Slot::new(5))
        .build();

    let current = harness.get_duties(&[0, 1], Epoch::new(0)).unwrap();
    assert_eq!(current.duties[0].attester_slot, Some(Slot::new(21)));

    let next = harness.get_duties(&[0, 1], Epoch::new(1)).unwrap();
    for duty in &next.duties {
        assert_eq!(duty.attester_slot.unwrap().epoch(32), Epoch::new(1));
    }

    assert_eq!(
        harness.get_duties(&[0], Epoch::new(2)),
        Err(DutiesError::InvalidEpochRequest {
            request_epoch: Epoch::new(2),
            current_epoch: Epoch::new(0),
        })
    );
}

#[test]
fn past_epochs_are_rejected() {
    let harness = BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .validator_count(16)
        .head_slot(Slot::new(8 * 3 + 2))
        .build();

    assert_eq!(
        harness.get_duties(&[0], Epoch::new(2)),
        Err(DutiesError::InvalidEpochRequest {
            request_epoch: Epoch::new(2),
            current_epoch: Epoch::new(3),
        })
    );
    assert!(harness.get_duties(&[0], Epoch::new(3)).is_ok());
    assert!(harness.get_duties(&[0], Epoch::new(4)).is_ok());
    assert_eq!(harness.chain.shuffling_cache.read().len(), 2);
}

#[test]
fn syncing_node_is_not_ready() {
    let harness = minimal_harness(16);
    harness.set_syncing(true);

    assert_eq!(
        harness.get_duties(&[0], Epoch::new(0)),
        Err(DutiesError::NotReady)
    );
    assert_eq!(
        harness.chain.proposer_duties(Epoch::new(0)),
        Err(DutiesError::NotReady)
    );

    // Syncing is checked before the request is validated.
    let request = DutiesRequest {
        pubkeys: vec![vec![0; 3]],
        epoch: Epoch::new(100),
    };
    assert_eq!(
        harness.chain.get_duties(&request),
        Err(DutiesError::NotReady)
    );

    // No shuffling was computed.
    assert!(harness.chain.shuffling_cache.read().is_empty());

    harness.set_syncing(false);
    assert!(harness.get_duties(&[0], Epoch::new(0)).is_ok());
}

#[test]
fn malformed_key_fails_the_batch() {
    let harness = minimal_harness(16);

    let request = DutiesRequest {
        pubkeys: vec![
            interop_pubkey(0).as_serialized().to_vec(),
            vec![1; 47],
            vec![2; 49],
        ],
        epoch: Epoch::new(0),
    };
    let error = harness.chain.get_duties(&request).unwrap_err();

    assert_eq!(
        error,
        DutiesError::MalformedPublicKey {
            index: 1,
            length: 47
        }
    );
    assert!(error.to_string().starts_with("incorrect key length"));

    // Keys are validated before the epoch.
    let request = DutiesRequest {
        pubkeys: vec![vec![]],
        epoch: Epoch::new(100),
    };
    assert_eq!(
        harness.chain.get_duties(&request),
        Err(DutiesError::MalformedPublicKey {
            index: 0,
            length: 0
        })
    );
    assert!(harness.chain.shuffling_cache.read().is_empty());
}

#[test]
fn unknown_key_names_the_key() {
    let harness = minimal_harness(16);
    let unknown = interop_pubkey(1_000);

    let error = harness.get_duties(&[0, 1_000], Epoch::new(0)).unwrap_err();

    assert_eq!(error, DutiesError::ValidatorNotFound(unknown));
    assert_eq!(
        error.to_string(),
        format!("validator {} does not exist", unknown)
    );
    assert!(error.to_string().starts_with("validator 0x"));
    assert!(error.to_string().contains(&unknown.as_hex_string()));
}

#[test]
fn store_index_must_match_registry() {
    let harness = minimal_harness(16);

    // An index beyond the registry.
    harness
        .chain
        .store
        .put_validator_index(&interop_pubkey(100), 5_000)
        .unwrap();
    assert_eq!(
        harness.get_duties(&[100], Epoch::new(0)),
        Err(DutiesError::ValidatorNotFound(interop_pubkey(100)))
    );

    // An index that belongs to another key.
    harness
        .chain
        .store
        .put_validator_index(&interop_pubkey(101), 3)
        .unwrap();
    assert_eq!(
        harness.get_duties(&[101], Epoch::new(0)),
        Err(DutiesError::ValidatorNotFound(interop_pubkey(101)))
    );
}

#[test]
fn inactive_validators_get_empty_duties() {
    let harness = BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .validator_count(16)
        .mutate_state(|builder| {
            let validators = builder.validators_mut();
            validators[3].exit_epoch = Epoch::new(0);
            validators[4].activation_epoch = Epoch::new(5);
            validators[5].slashed = true;
        })
        .build();

    let response = harness.get_duties(&[3, 4, 5], Epoch::new(0)).unwrap();
    let (exited, pending, slashed) = (
        &response.duties[0],
        &response.duties[1],
        &response.duties[2],
    );

    for (duty, status) in [
        (exited, ValidatorStatus::Exited),
        (pending, ValidatorStatus::Pending),
    ] {
        assert_eq!(duty.status, status);
        assert_eq!(duty.attester_slot, None);
        assert_eq!(duty.committee_index, None);
        assert!(duty.committee.is_empty());
        assert!(!duty.is_aggregator);
        assert!(duty.proposer_slots.is_empty());
    }

    // Slashed validators keep their duties until they exit.
    assert_eq!(slashed.status, ValidatorStatus::Slashed);
    assert!(slashed.attester_slot.is_some());
}

#[test]
fn all_validators_share_one_shuffling() {
    let validator_count = 16_384;
    let harness = mainnet_harness(validator_count);
    let epoch = Epoch::new(0);
    let indices = (0..validator_count).collect::<Vec<_>>();

    let response = harness.get_duties(&indices, epoch).unwrap();
    assert_eq!(response.duties.len(), validator_count);
    assert_eq!(harness.chain.shuffling_cache.read().len(), 1);

    let committee_cache = harness.chain.committee_cache(epoch).unwrap();
    assert_eq!(committee_cache.committees_per_slot(), 4);

    // Every validator sits in exactly one committee slot of the epoch.
    let mut seen = HashSet::new();
    for (i, duty) in response.duties.iter().enumerate() {
        assert_eq!(duty.validator_index, i as u64);
        assert_eq!(duty.attester_slot.unwrap().epoch(32), epoch);
        assert_eq!(duty.committees_at_slot, 4);
        assert_eq!(duty.committee.len(), 128);
        assert!(seen.insert((
            duty.attester_slot.unwrap(),
            duty.committee_index.unwrap(),
            duty.committee_position.unwrap()
        )));
    }
    assert!(response.duties.iter().any(|duty| duty.is_aggregator));
    assert!(response.duties.iter().any(|duty| !duty.is_aggregator));

    // A second request is served from the same computation.
    harness.get_duties(&indices[..100], epoch).unwrap();
    assert!(Arc::ptr_eq(
        &committee_cache,
        &harness.chain.committee_cache(epoch).unwrap()
    ));
    assert_eq!(harness.chain.shuffling_cache.read().len(), 1);
}

#[test]
fn concurrent_requests_compute_one_shuffling() {
    let harness = &mainnet_harness(4_096);
    let epoch = Epoch::new(1);
    let chain = &harness.chain;

    let caches = thread::scope(|s| {
        let handles = (0..8)
            .map(|i| {
                s.spawn(move || {
                    let response = harness
                        .get_duties(&[i * 100, i * 100 + 1], epoch)
                        .unwrap();
                    assert_eq!(response.duties.len(), 2);
                    chain.committee_cache(epoch).unwrap()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    for cache in &caches {
        assert!(Arc::ptr_eq(cache, &caches[0]));
    }
    assert_eq!(chain.shuffling_cache.read().len(), 1);
}

#[test]
fn concurrent_requests_compute_proposers_once() {
    let harness = &mainnet_harness(16_384);
    let epoch = Epoch::new(0);
    let chain = &harness.chain;
    let head = chain.head().unwrap();
    let head = &head;
    let threads = 16;
    let barrier = &Barrier::new(threads);

    let proposers = thread::scope(|s| {
        let handles = (0..threads)
            .map(|i| {
                s.spawn(move || {
                    barrier.wait();
                    let proposers = chain.proposers_for_epoch(head, epoch).unwrap();
                    harness.get_duties(&[i], epoch).unwrap();
                    proposers
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    // Every thread observes the one list computed for `(epoch, head root)`.
    for list in &proposers {
        assert!(Arc::ptr_eq(list, &proposers[0]));
    }
    assert_eq!(proposers[0].len(), 32);
    assert_eq!(chain.beacon_proposer_cache.read().len(), 1);
}

#[test]
fn next_epoch_uses_a_distinct_shuffling() {
    let harness = BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .validator_count(64)
        .head_slot(Slot::new(8 * 4))
        .mutate_state(|builder| {
            builder.fill_randao_mixes(distinct_mix);
        })
        .build();

    let current = harness.chain.beacon_committees(Epoch::new(4)).unwrap();
    let next = harness.chain.beacon_committees(Epoch::new(5)).unwrap();

    assert_eq!(current.len(), next.len());
    assert_eq!(current[0].slot, Slot::new(32));
    assert_eq!(next[0].slot, Slot::new(40));
    assert_ne!(
        current.iter().map(|c| &c.committee).collect::<Vec<_>>(),
        next.iter().map(|c| &c.committee).collect::<Vec<_>>()
    );
    assert_eq!(harness.chain.shuffling_cache.read().len(), 2);
}

#[test]
fn committees_match_duties() {
    let harness = minimal_harness(8 * 4 * 3 + 5);
    let epoch = Epoch::new(1);

    let committees = harness.chain.beacon_committees(epoch).unwrap();
    let response = harness
        .get_duties(&(0..101).collect::<Vec<_>>(), epoch)
        .unwrap();

    for duty in &response.duties {
        let committee = committees
            .iter()
            .find(|c| Some(c.slot) == duty.attester_slot && Some(c.index) == duty.committee_index)
            .unwrap();
        assert_eq!(
            committee
                .committee
                .iter()
                .map(|&i| i as u64)
                .collect::<Vec<_>>(),
            duty.committee
        );
    }
}

/// A harness in which every validator exits at the end of epoch 0, so epoch 1 has no shuffling.
fn exiting_harness() -> BeaconChainHarness<MinimalEthSpec> {
    BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .validator_count(16)
        .mutate_state(|builder| {
            for validator in builder.validators_mut() {
                validator.exit_epoch = Epoch::new(1);
            }
        })
        .build()
}

#[test]
fn epoch_without_active_validators_has_empty_duties() {
    let harness = exiting_harness();
    let epoch = Epoch::new(1);

    let response = harness.get_duties(&[0, 1], epoch).unwrap();
    assert_eq!(response.epoch, epoch);
    assert_eq!(response.duties.len(), 2);
    for (i, duty) in response.duties.iter().enumerate() {
        assert_eq!(
            *duty,
            ValidatorDuty::no_duties(i as u64, interop_pubkey(i), ValidatorStatus::Exited)
        );
    }

    // No shuffling or proposer work was started.
    assert!(harness.chain.shuffling_cache.read().is_empty());
    assert!(harness.chain.beacon_proposer_cache.read().is_empty());

    // The current epoch is unaffected.
    let response = harness.get_duties(&[0], Epoch::new(0)).unwrap();
    assert!(response.duties[0].attester_slot.is_some());
}

#[test]
fn failed_computation_is_not_cached() {
    let harness = exiting_harness();
    let epoch = Epoch::new(1);

    assert_eq!(
        harness.chain.beacon_committees(epoch),
        Err(DutiesError::BeaconChainError(
            BeaconChainError::BeaconStateError(BeaconStateError::InsufficientValidators)
        ))
    );
    let shuffling_id = harness
        .chain
        .head()
        .unwrap()
        .shuffling_ids()
        .id_for_epoch(epoch)
        .unwrap();
    assert!(harness
        .chain
        .shuffling_cache
        .write()
        .get(&shuffling_id)
        .is_none());

    // The same shuffling succeeds once the head has active validators.
    let mut state = harness.head_state();
    for validator in state.validators.iter_mut() {
        validator.exit_epoch = harness.spec.far_future_epoch;
    }
    harness.update_head(Hash256::ZERO, state).unwrap();

    assert!(!harness.chain.beacon_committees(epoch).unwrap().is_empty());
    let response = harness.get_duties(&[0], epoch).unwrap();
    assert!(response.duties[0].attester_slot.is_some());
}

#[test]
fn head_update_imports_new_validators() {
    let harness = minimal_harness(8);
    assert_eq!(
        harness.get_duties(&[10], Epoch::new(0)),
        Err(DutiesError::ValidatorNotFound(interop_pubkey(10)))
    );

    let mut state = harness.head_state();
    let spec = harness.spec.clone();
    state.validators.extend((8..12).map(|i| {
        Validator::new_active(
            interop_pubkey(i),
            spec.max_effective_balance,
            Epoch::new(0),
            &spec,
        )
    }));
    harness
        .update_head(Hash256::repeat_byte(1), state)
        .unwrap();

    let response = harness.get_duties(&[10], Epoch::new(0)).unwrap();
    assert_eq!(response.dependent_root, Hash256::repeat_byte(1));
    assert_eq!(response.duties[0].validator_index, 10);
}

#[test]
fn shuffling_cache_respects_capacity() {
    let harness = BeaconChainHarness::builder(MinimalEthSpec)
        .default_spec()
        .chain_config(ChainConfig {
            shuffling_cache_size: 2,
            ..ChainConfig::default()
        })
        .validator_count(16)
        .build();

    for byte in 1..=4 {
        let state = harness.head_state();
        harness
            .update_head(Hash256::repeat_byte(byte), state)
            .unwrap();
        harness.get_duties(&[0], Epoch::new(0)).unwrap();
    }

    let cache = harness.chain.shuffling_cache.read();
    assert_eq!(cache.len(), 2);
    let head_ids = harness.chain.head().unwrap().shuffling_ids();
    assert!(cache.contains(&head_ids.current));
}

#[test]
fn duties_response_serde() {
    let harness = minimal_harness(16);
    let response = harness.get_duties(&[0, 7], Epoch::new(0)).unwrap();

    let json = serde_json::to_string(&response).unwrap();
    assert_eq!(
        serde_json::from_str::<DutiesResponse>(&json).unwrap(),
        response
    );
}
