#![allow(clippy::arithmetic_side_effects)]

use super::BeaconState;
use crate::*;
use core::num::NonZeroUsize;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use swap_or_not_shuffle::shuffle_list;


/// Computes and stores the shuffling for an epoch. Provides various getters to allow callers to
/// read the committees for the given epoch.
///
/// The shuffled active set is cut into `committees_per_slot * slots_per_epoch` committees whose
/// sizes differ by at most one, the larger committees coming first.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CommitteeCache {
    initialized_epoch: Option<Epoch>,
    shuffling: Vec<usize>,
    shuffling_positions: Vec<NonZeroUsizeOption>,
    committees_per_slot: u64,
    slots_per_epoch: u64,
}

/// Equivalent to `Option<NonZeroUsize>`, with serde that matches a plain `usize`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonZeroUsizeOption(Option<NonZeroUsize>);

impl From<Option<usize>> for NonZeroUsizeOption {
    fn from(opt: Option<usize>) -> Self {
        let opt = opt.and_then(|i| NonZeroUsize::new(i + 1));
        Self(opt)
    }
}

impl NonZeroUsizeOption {
    pub fn get(self) -> Option<usize> {
        self.0.map(|i| i.get() - 1)
    }

    pub fn is_some(self) -> bool {
        self.0.is_some()
    }

    pub fn is_none(self) -> bool {
        self.0.is_none()
    }
}

impl CommitteeCache {
    /// Return a new, fully initialized cache.
    ///
    /// `epoch` must be within one epoch of the state's current epoch.
    pub fn initialized<E: EthSpec>(
        state: &BeaconState<E>,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<Arc<CommitteeCache>, BeaconStateError> {
        RelativeEpoch::from_epoch(state.current_epoch(), epoch)
            .map_err(|_| BeaconStateError::EpochOutOfBounds)?;

        if E::slots_per_epoch() == 0 {
            return Err(BeaconStateError::ZeroSlotsPerEpoch);
        }

        let active_validator_indices = state.get_active_validator_indices(epoch);

        if active_validator_indices.is_empty() {
            return Err(BeaconStateError::InsufficientValidators);
        }

        let committees_per_slot =
            E::get_committee_count_per_slot(active_validator_indices.len(), spec)? as u64;

        let seed = state.get_seed(epoch, Domain::BeaconAttester, spec)?;

        let shuffling = shuffle_list(
            active_validator_indices,
            spec.shuffle_round_count,
            seed.as_slice(),
            false,
        )
        .ok_or(BeaconStateError::UnableToShuffle)?;

        let mut shuffling_positions = vec![<_>::default(); state.validators.len()];
        for (i, &v) in shuffling.iter().enumerate() {
            *shuffling_positions
                .get_mut(v)
                .ok_or(BeaconStateError::ShuffleIndexOutOfBounds(v))? = Some(i).into();
        }

        Ok(Arc::new(CommitteeCache {
            initialized_epoch: Some(epoch),
            shuffling,
            shuffling_positions,
            committees_per_slot,
            slots_per_epoch: E::slots_per_epoch(),
        }))
    }

    /// Returns `true` if the cache has been initialized at the supplied `epoch`.
    ///
    /// An non-initialized cache does not provide any useful information.
    pub fn is_initialized_at(&self, epoch: Epoch) -> bool {
        Some(epoch) == self.initialized_epoch
    }

    /// The epoch this cache was built for, if any.
    pub fn initialized_epoch(&self) -> Option<Epoch> {
        self.initialized_epoch
    }

    /// Returns the **shuffled** list of active validator indices for the initialized epoch.
    ///
    /// These indices are not in ascending order.
    ///
    /// Always returns `&[]` for a non-initialized epoch.
    pub fn shuffling(&self) -> &[usize] {
        &self.shuffling
    }

    /// Get the Beacon committee for the given `slot` and `index`.
    ///
    /// Return `None` if the cache is uninitialized, or the `slot` or `index` is out of range.
    pub fn get_beacon_committee(
        &self,
        slot: Slot,
        index: CommitteeIndex,
    ) -> Option<BeaconCommittee<'_>> {
        let epoch = self.initialized_epoch?;

        if slot.epoch(self.slots_per_epoch) != epoch || index >= self.committees_per_slot {
            return None;
        }

        let committee_index = compute_committee_index_in_epoch(
            slot,
            self.slots_per_epoch as usize,
            self.committees_per_slot as usize,
            index as usize,
        );
        let committee = self.compute_committee(committee_index)?;

        Some(BeaconCommittee {
            slot,
            index,
            committee,
        })
    }

    /// Get all the Beacon committees at a given `slot`.
    ///
    /// Committees are sorted by ascending index order 0..committees_per_slot
    pub fn get_beacon_committees_at_slot(
        &self,
        slot: Slot,
    ) -> Result<Vec<BeaconCommittee<'_>>, BeaconStateError> {
        let epoch = self.require_initialized()?;

        if slot.epoch(self.slots_per_epoch) != epoch {
            return Err(BeaconStateError::SlotOutOfBounds);
        }

        (0..self.committees_per_slot())
            .map(|index| {
                self.get_beacon_committee(slot, index)
                    .ok_or(BeaconStateError::NoCommittee { slot, index })
            })
            .collect()
    }

    /// Returns all committees for `self.initialized_epoch`.
    pub fn get_all_beacon_committees(&self) -> Result<Vec<BeaconCommittee<'_>>, BeaconStateError> {
        let initialized_epoch = self.require_initialized()?;

        initialized_epoch.slot_iter(self.slots_per_epoch).try_fold(
            Vec::with_capacity(self.epoch_committee_count()),
            |mut vec, slot| {
                vec.append(&mut self.get_beacon_committees_at_slot(slot)?);
                Ok(vec)
            },
        )
    }

    /// Returns the `AttestationDuty` for the given `validator_index`.
    ///
    /// Returns `None` if the `validator_index` does not exist, does not have duties or `Self`
    /// is non-initialized.
    pub fn get_attestation_duties(&self, validator_index: usize) -> Option<AttestationDuty> {
        let epoch = self.initialized_epoch?;
        let position = self.shuffled_position(validator_index)?;

        let index_in_epoch = compute_committee_index_for_position(
            self.epoch_committee_count(),
            position,
            self.shuffling.len(),
        )?;
        let range = self.compute_committee_range(index_in_epoch)?;

        let committees_per_slot = self.committees_per_slot as usize;
        let slot_offset = (index_in_epoch / committees_per_slot) as u64;
        let index = (index_in_epoch % committees_per_slot) as u64;

        Some(AttestationDuty {
            slot: epoch.start_slot(self.slots_per_epoch) + slot_offset,
            index,
            committee_position: position - range.start,
            committee_len: range.len(),
            committees_at_slot: self.committees_per_slot,
        })
    }

    /// Returns the number of active validators in the initialized epoch.
    ///
    /// Always returns `usize::default()` for a non-initialized epoch.
    pub fn active_validator_count(&self) -> usize {
        self.shuffling.len()
    }

    /// Returns the total number of committees in the initialized epoch.
    ///
    /// Always returns `usize::default()` for a non-initialized epoch.
    pub fn epoch_committee_count(&self) -> usize {
        epoch_committee_count(
            self.committees_per_slot as usize,
            self.slots_per_epoch as usize,
        )
    }

    /// Returns the number of committees per slot for this cache's epoch.
    pub fn committees_per_slot(&self) -> u64 {
        self.committees_per_slot
    }

    /// Returns the index of some validator in `self.shuffling`.
    ///
    /// Always returns `None` for a non-initialized epoch.
    pub fn shuffled_position(&self, validator_index: usize) -> Option<usize> {
        self.shuffling_positions
            .get(validator_index)?
            .get()
    }

    /// Returns a slice of `self.shuffling` that represents the `index`'th committee in the epoch.
    fn compute_committee(&self, index: usize) -> Option<&[usize]> {
        self.shuffling.get(self.compute_committee_range(index)?)
    }

    /// Returns a range of `self.shuffling` that represents the `index`'th committee in the epoch.
    fn compute_committee_range(&self, index: usize) -> Option<Range<usize>> {
        compute_committee_range_in_epoch(self.epoch_committee_count(), index, self.shuffling.len())
    }

    fn require_initialized(&self) -> Result<Epoch, BeaconStateError> {
        self.initialized_epoch
            .ok_or(BeaconStateError::CommitteeCacheUninitialized(None))
    }
}

/// Computes the position of the given `committee_index` with respect to all committees in the
/// epoch.
///
/// The return result may be used to provide input to the `compute_committee_range_in_epoch`
/// function.
pub fn compute_committee_index_in_epoch(
    slot: Slot,
    slots_per_epoch: usize,
    committees_per_slot: usize,
    committee_index: usize,
) -> usize {
    (slot.as_usize() % slots_per_epoch) * committees_per_slot + committee_index
}

/// Computes the range for slicing the shuffled indices to determine the members of a committee.
///
/// With `base = shuffling_len / epoch_committee_count` and
/// `rem = shuffling_len % epoch_committee_count`, committee `k` starts at
/// `k * base + min(k, rem)` and the first `rem` committees hold `base + 1` members.
///
/// The `index_in_epoch` parameter can be computed using
/// `compute_committee_index_in_epoch`.
pub fn compute_committee_range_in_epoch(
    epoch_committee_count: usize,
    index_in_epoch: usize,
    shuffling_len: usize,
) -> Option<Range<usize>> {
    if epoch_committee_count == 0 || index_in_epoch >= epoch_committee_count {
        return None;
    }

    let base = shuffling_len / epoch_committee_count;
    let rem = shuffling_len % epoch_committee_count;

    let start = index_in_epoch * base + std::cmp::min(index_in_epoch, rem);
    let end = start + base + usize::from(index_in_epoch < rem);

    Some(start..end)
}

/// The inverse of `compute_committee_range_in_epoch`: the index in the epoch of the committee
/// covering `position` in the shuffling.
fn compute_committee_index_for_position(
    epoch_committee_count: usize,
    position: usize,
    shuffling_len: usize,
) -> Option<usize> {
    if epoch_committee_count == 0 || position >= shuffling_len {
        return None;
    }

    let base = shuffling_len / epoch_committee_count;
    let rem = shuffling_len % epoch_committee_count;
    // Positions before `boundary` belong to the `rem` committees with an extra member.
    let boundary = rem * (base + 1);

    if position < boundary {
        Some(position / (base + 1))
    } else {
        // `position < shuffling_len` implies `base > 0` here.
        Some(rem + (position - boundary) / base)
    }
}

/// Returns the total number of committees in an epoch.
pub fn epoch_committee_count(committees_per_slot: usize, slots_per_epoch: usize) -> usize {
    committees_per_slot * slots_per_epoch
}
