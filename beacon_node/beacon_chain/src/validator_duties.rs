//! Serves the duties of a batch of validators for the current or next epoch of the head.
use crate::canonical_head::BeaconSnapshot;
use crate::errors::{BeaconChainError, DutiesError};
use crate::metrics;
use crate::{BeaconChain, BeaconChainTypes, SyncStatus};
use slog::{debug, trace};
use std::sync::Arc;
use store::ValidatorIndexStore;
use types::*;

impl<T: BeaconChainTypes> BeaconChain<T> {
    /// Returns one duty per key of `request`, in request order.
    ///
    /// The request is validated before any shuffling or proposer work starts. A key that is not
    /// 48 bytes long or not known to the store fails the whole batch.
    pub fn get_duties(&self, request: &DutiesRequest) -> Result<DutiesResponse, DutiesError> {
        metrics::inc_counter(&metrics::DUTIES_REQUESTS);
        let timer = metrics::start_timer(&metrics::DUTIES_REQUEST_TIMES);

        let result = self.compute_duties(request);
        if let Err(e) = &result {
            metrics::inc_counter(&metrics::DUTIES_REQUEST_FAILURES);
            debug!(
                self.log,
                "Duties request failed";
                "error" => %e,
                "epoch" => %request.epoch,
            );
        }

        metrics::stop_timer(timer);
        result
    }

    fn compute_duties(&self, request: &DutiesRequest) -> Result<DutiesResponse, DutiesError> {
        self.check_synced()?;

        let pubkeys = request
            .pubkeys
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                PublicKeyBytes::deserialize(bytes).map_err(|_| DutiesError::MalformedPublicKey {
                    index,
                    length: bytes.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        metrics::inc_counter_by(&metrics::DUTIES_REQUESTED_KEYS, pubkeys.len() as u64);

        let epoch = request.epoch;
        let head = self.head_for_epoch(epoch)?;

        let validator_indices = pubkeys
            .iter()
            .map(|pubkey| self.validator_index(&head.beacon_state, pubkey))
            .collect::<Result<Vec<_>, _>>()?;

        // An epoch without active validators has no shuffling and no proposers.
        if !head
            .beacon_state
            .validators
            .iter()
            .any(|validator| validator.is_active_at(epoch))
        {
            let duties = pubkeys
                .iter()
                .zip(validator_indices)
                .map(|(pubkey, validator_index)| {
                    let validator = head.beacon_state.get_validator(validator_index)?;
                    Ok(ValidatorDuty::no_duties(
                        validator_index as u64,
                        *pubkey,
                        ValidatorStatus::from_validator(validator, epoch),
                    ))
                })
                .collect::<Result<Vec<_>, BeaconStateError>>()?;

            return Ok(DutiesResponse {
                epoch,
                dependent_root: head.beacon_block_root,
                duties,
            });
        }

        let duties = self.with_committee_cache(&head, epoch, |committee_cache, _| {
            let proposers = self.proposers_for_epoch(&head, epoch)?;

            pubkeys
                .iter()
                .zip(validator_indices)
                .map(|(pubkey, validator_index)| {
                    self.validator_duty(
                        &head.beacon_state,
                        committee_cache,
                        &proposers,
                        epoch,
                        validator_index,
                        *pubkey,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        trace!(
            self.log,
            "Served validator duties";
            "epoch" => %epoch,
            "validators" => duties.len(),
        );

        Ok(DutiesResponse {
            epoch,
            dependent_root: head.beacon_block_root,
            duties,
        })
    }

    /// Returns the block proposers of every slot in `epoch`, along with the root of the block
    /// which decided them.
    pub fn proposer_duties(
        &self,
        epoch: Epoch,
    ) -> Result<(Hash256, Vec<ProposerDuty>), DutiesError> {
        self.check_synced()?;
        let head = self.head_for_epoch(epoch)?;
        let proposers = self.proposers_for_epoch(&head, epoch)?;

        let duties = epoch
            .slot_iter(T::EthSpec::slots_per_epoch())
            .zip(proposers.iter())
            .map(|(slot, &validator_index)| {
                let validator = head.beacon_state.get_validator(validator_index)?;
                Ok(ProposerDuty {
                    pubkey: validator.pubkey,
                    validator_index: validator_index as u64,
                    slot,
                })
            })
            .collect::<Result<Vec<_>, BeaconStateError>>()?;

        Ok((head.beacon_block_root, duties))
    }

    /// Returns every committee of `epoch`, sorted by slot and then committee index.
    pub fn beacon_committees(
        &self,
        epoch: Epoch,
    ) -> Result<Vec<OwnedBeaconCommittee>, DutiesError> {
        self.check_synced()?;
        let head = self.head_for_epoch(epoch)?;

        let committees: Vec<OwnedBeaconCommittee> =
            self.with_committee_cache(&head, epoch, |committee_cache, _| {
                Ok(committee_cache
                    .get_all_beacon_committees()?
                    .into_iter()
                    .map(BeaconCommittee::into_owned)
                    .collect())
            })?;

        Ok(committees)
    }

    fn check_synced(&self) -> Result<(), DutiesError> {
        if self.sync_status.is_syncing() {
            Err(DutiesError::NotReady)
        } else {
            Ok(())
        }
    }

    /// Returns the head if duties for `epoch` can be served from it.
    fn head_for_epoch(
        &self,
        epoch: Epoch,
    ) -> Result<Arc<BeaconSnapshot<T::EthSpec>>, DutiesError> {
        let head = self.head()?;
        let current_epoch = head.current_epoch();

        if epoch != current_epoch && epoch != head.beacon_state.next_epoch()? {
            return Err(DutiesError::InvalidEpochRequest {
                request_epoch: epoch,
                current_epoch,
            });
        }

        Ok(head)
    }

    /// Looks up the index of `pubkey`, checking that the registry of `state` agrees with the store.
    fn validator_index(
        &self,
        state: &BeaconState<T::EthSpec>,
        pubkey: &PublicKeyBytes,
    ) -> Result<usize, DutiesError> {
        self.store
            .get_validator_index(pubkey)?
            .filter(|&index| {
                state
                    .get_validator(index)
                    .is_ok_and(|validator| validator.pubkey == *pubkey)
            })
            .ok_or(DutiesError::ValidatorNotFound(*pubkey))
    }

    fn validator_duty(
        &self,
        state: &BeaconState<T::EthSpec>,
        committee_cache: &CommitteeCache,
        proposers: &[usize],
        epoch: Epoch,
        validator_index: usize,
        pubkey: PublicKeyBytes,
    ) -> Result<ValidatorDuty, BeaconChainError> {
        let validator = state.get_validator(validator_index)?;
        let status = ValidatorStatus::from_validator(validator, epoch);

        let duty = match attestation_duty(committee_cache, validator_index) {
            Ok(duty) => duty,
            Err(BeaconStateError::ValidatorIsInactive { .. }) => {
                return Ok(ValidatorDuty::no_duties(
                    validator_index as u64,
                    pubkey,
                    status,
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let committee = committee_cache
            .get_beacon_committee(duty.slot, duty.index)
            .ok_or(BeaconStateError::NoCommittee {
                slot: duty.slot,
                index: duty.index,
            })?;
        let is_aggregator =
            state.is_aggregator(duty.slot, validator_index, duty.committee_len, &self.spec)?;

        let proposer_slots = epoch
            .slot_iter(T::EthSpec::slots_per_epoch())
            .zip(proposers)
            .filter(|(_, proposer)| **proposer == validator_index)
            .map(|(slot, _)| slot)
            .collect();

        Ok(ValidatorDuty {
            validator_index: validator_index as u64,
            pubkey,
            status,
            attester_slot: Some(duty.slot),
            committee_index: Some(duty.index),
            committee_position: Some(duty.committee_position),
            committees_at_slot: duty.committees_at_slot,
            committee: committee.committee.iter().map(|&i| i as u64).collect(),
            is_aggregator,
            proposer_slots,
        })
    }
}

/// Returns the attestation duty of `validator_index`, or `ValidatorIsInactive` if it is not part
/// of the shuffling.
fn attestation_duty(
    committee_cache: &CommitteeCache,
    validator_index: usize,
) -> Result<AttestationDuty, BeaconStateError> {
    committee_cache
        .get_attestation_duties(validator_index)
        .ok_or(BeaconStateError::ValidatorIsInactive {
            val_index: validator_index,
        })
}
