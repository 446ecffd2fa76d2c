use crate::*;
use derivative::Derivative;
use ethereum_hashing::hash;
use safe_arith::{ArithError, SafeArith};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use swap_or_not_shuffle::compute_shuffled_index;

pub use self::committee_cache::{
    compute_committee_index_in_epoch, compute_committee_range_in_epoch, epoch_committee_count,
    CommitteeCache,
};

mod committee_cache;

const MAX_RANDOM_BYTE: u64 = (1 << 8) - 1;

const NUM_DOMAIN_BYTES: usize = 4;
const NUM_EPOCH_BYTES: usize = 8;
const NUM_MIX_BYTES: usize = 32;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    EpochOutOfBounds,
    SlotOutOfBounds,
    UnknownValidator(usize),
    ValidatorIsInactive {
        val_index: usize,
    },
    UnableToShuffle,
    ShuffleIndexOutOfBounds(usize),
    RandaoMixesOutOfBounds(usize),
    TooManyValidators,
    InsufficientValidators,
    InsufficientRandaoMixes,
    NoCommittee {
        slot: Slot,
        index: CommitteeIndex,
    },
    ZeroSlotsPerEpoch,
    CommitteeCacheUninitialized(Option<RelativeEpoch>),
    CommitteeCacheWrongEpoch {
        initialized_epoch: Option<Epoch>,
        request_epoch: Epoch,
    },
    RelativeEpochError(RelativeEpochError),
    ArithError(ArithError),
}

/// The state of the chain that duties are derived from.
///
/// Only the fields needed to compute shufflings, proposers and aggregators are kept.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(
    Debug(bound = "E: EthSpec"),
    PartialEq(bound = "E: EthSpec"),
    Clone(bound = "E: EthSpec")
)]
#[serde(bound = "E: EthSpec")]
pub struct BeaconState<E>
where
    E: EthSpec,
{
    pub slot: Slot,
    pub fork: Fork,

    // Registry
    pub validators: Vec<Validator>,

    // Randomness
    pub randao_mixes: Vec<Hash256>,

    #[serde(skip)]
    #[derivative(Debug = "ignore")]
    _phantom: PhantomData<E>,
}

impl<E: EthSpec> BeaconState<E> {
    /// Create a new state with an empty registry and a zeroed RANDAO mix vector of the preset
    /// length.
    pub fn new(slot: Slot, fork: Fork) -> Self {
        BeaconState {
            slot,
            fork,
            validators: vec![],
            randao_mixes: vec![Hash256::ZERO; E::epochs_per_historical_vector()],
            _phantom: PhantomData,
        }
    }

    /// The epoch corresponding to `self.slot`.
    pub fn current_epoch(&self) -> Epoch {
        self.slot.epoch(E::slots_per_epoch())
    }

    /// The epoch following `self.current_epoch()`.
    pub fn next_epoch(&self) -> Result<Epoch, Error> {
        Ok(self.current_epoch().safe_add(1)?)
    }

    /// Returns the active validator indices for the given epoch.
    ///
    /// Does not utilize the cache, performs a full iteration over the validator registry.
    pub fn get_active_validator_indices(&self, epoch: Epoch) -> Vec<usize> {
        get_active_validator_indices(&self.validators, epoch)
    }

    /// Safe indexer for the `validators` list.
    pub fn get_validator(&self, validator_index: usize) -> Result<&Validator, Error> {
        self.validators
            .get(validator_index)
            .ok_or(Error::UnknownValidator(validator_index))
    }

    /// Return the effective balance for a validator with the given `validator_index`.
    pub fn get_effective_balance(&self, validator_index: usize) -> Result<u64, Error> {
        self.get_validator(validator_index)
            .map(|v| v.effective_balance)
    }

    /// Return the randao mix at a recent ``epoch``.
    ///
    /// The vector is a ring: any epoch maps onto it by `epoch % EPOCHS_PER_HISTORICAL_VECTOR`.
    pub fn get_randao_mix(&self, epoch: Epoch) -> Result<&Hash256, Error> {
        let i = epoch
            .as_usize()
            .safe_rem(E::epochs_per_historical_vector())?;
        self.randao_mixes
            .get(i)
            .ok_or(Error::RandaoMixesOutOfBounds(i))
    }

    /// Set the randao mix at a recent ``epoch``.
    pub fn set_randao_mix(&mut self, epoch: Epoch, mix: Hash256) -> Result<(), Error> {
        let i = epoch
            .as_usize()
            .safe_rem(E::epochs_per_historical_vector())?;
        *self
            .randao_mixes
            .get_mut(i)
            .ok_or(Error::RandaoMixesOutOfBounds(i))? = mix;
        Ok(())
    }

    /// Generate a seed for the given `epoch`.
    pub fn get_seed(
        &self,
        epoch: Epoch,
        domain_type: Domain,
        spec: &ChainSpec,
    ) -> Result<Hash256, Error> {
        // Bypass the safe getter for RANDAO so we can gracefully handle the scenario where
        // `epoch == 0`.
        let mix = {
            let i = epoch
                .safe_add(E::epochs_per_historical_vector() as u64)?
                .safe_sub(spec.min_seed_lookahead.as_u64())?
                .safe_sub(1)?;
            let i_mod = i.as_usize().safe_rem(self.randao_mixes.len())?;
            self.randao_mixes
                .get(i_mod)
                .ok_or(Error::InsufficientRandaoMixes)?
        };
        let domain_bytes = spec.get_domain_constant(domain_type).to_le_bytes();
        let epoch_bytes = epoch.as_u64().to_le_bytes();

        let mut preimage = [0; NUM_DOMAIN_BYTES + NUM_EPOCH_BYTES + NUM_MIX_BYTES];
        preimage[0..NUM_DOMAIN_BYTES].copy_from_slice(&domain_bytes);
        preimage[NUM_DOMAIN_BYTES..NUM_DOMAIN_BYTES + NUM_EPOCH_BYTES]
            .copy_from_slice(&epoch_bytes);
        preimage[NUM_DOMAIN_BYTES + NUM_EPOCH_BYTES..].copy_from_slice(mix.as_slice());

        Ok(Hash256::from_slice(&hash(&preimage)))
    }

    /// Returns the beacon proposer index for each `slot` in `epoch`.
    ///
    /// The returned `Vec` contains one proposer index for each slot, in slot order.
    ///
    /// `epoch` must be the previous, current or next epoch of the state. Proposers for the next
    /// epoch are computed from the balances of this snapshot.
    pub fn get_beacon_proposer_indices(
        &self,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<Vec<usize>, Error> {
        RelativeEpoch::from_epoch(self.current_epoch(), epoch)?;

        let indices = self.get_active_validator_indices(epoch);

        epoch
            .slot_iter(E::slots_per_epoch())
            .map(|slot| {
                let seed = self.get_beacon_proposer_seed(slot, spec)?;
                self.compute_proposer_index(&indices, &seed, spec)
            })
            .collect()
    }

    /// Compute the seed to use for the beacon proposer selection at the given `slot`.
    pub fn get_beacon_proposer_seed(&self, slot: Slot, spec: &ChainSpec) -> Result<Vec<u8>, Error> {
        let epoch = slot.epoch(E::slots_per_epoch());
        let mut preimage = self
            .get_seed(epoch, Domain::BeaconProposer, spec)?
            .as_slice()
            .to_vec();
        preimage.extend_from_slice(&slot.as_u64().to_le_bytes());
        Ok(hash(&preimage))
    }

    /// Compute the proposer (not necessarily for the Beacon chain) from a list of indices.
    pub fn compute_proposer_index(
        &self,
        indices: &[usize],
        seed: &[u8],
        spec: &ChainSpec,
    ) -> Result<usize, Error> {
        if indices.is_empty() {
            return Err(Error::InsufficientValidators);
        }

        let mut i = 0;
        loop {
            let shuffled_index = compute_shuffled_index(
                i.safe_rem(indices.len())?,
                indices.len(),
                seed,
                spec.shuffle_round_count,
            )
            .ok_or(Error::UnableToShuffle)?;
            let candidate_index = *indices
                .get(shuffled_index)
                .ok_or(Error::ShuffleIndexOutOfBounds(shuffled_index))?;
            let random_byte = Self::shuffling_random_byte(i, seed)?;
            let effective_balance = self.get_effective_balance(candidate_index)?;
            if effective_balance.safe_mul(MAX_RANDOM_BYTE)?
                >= spec
                    .max_effective_balance
                    .safe_mul(u64::from(random_byte))?
            {
                return Ok(candidate_index);
            }
            i = i.safe_add(1)?;
        }
    }

    /// Get a random byte from the given `seed`.
    ///
    /// Used by the proposer selection to weight candidates by effective balance.
    fn shuffling_random_byte(i: usize, seed: &[u8]) -> Result<u8, Error> {
        let mut preimage = seed.to_vec();
        preimage.extend_from_slice(&(i.safe_div(32)? as u64).to_le_bytes());
        let index = i.safe_rem(32)?;
        hash(&preimage)
            .get(index)
            .copied()
            .ok_or(Error::ShuffleIndexOutOfBounds(index))
    }

    /// The selection hash of `validator_index` for `slot`.
    ///
    /// `hash(seed ‖ slot ‖ validator_index)` where `seed` is the `SelectionProof` seed of the
    /// slot's epoch.
    pub fn get_selection_hash(
        &self,
        slot: Slot,
        validator_index: usize,
        spec: &ChainSpec,
    ) -> Result<Hash256, Error> {
        let epoch = slot.epoch(E::slots_per_epoch());
        let mut preimage = self
            .get_seed(epoch, Domain::SelectionProof, spec)?
            .as_slice()
            .to_vec();
        preimage.extend_from_slice(&slot.as_u64().to_le_bytes());
        preimage.extend_from_slice(&(validator_index as u64).to_le_bytes());
        Ok(Hash256::from_slice(&hash(&preimage)))
    }

    /// Returns `true` if `validator_index` is selected to aggregate for its committee at `slot`.
    pub fn is_aggregator(
        &self,
        slot: Slot,
        validator_index: usize,
        committee_len: usize,
        spec: &ChainSpec,
    ) -> Result<bool, Error> {
        let modulo = std::cmp::max(
            1,
            (committee_len as u64).safe_div(spec.target_aggregators_per_committee)?,
        );
        let selection_hash = self.get_selection_hash(slot, validator_index, spec)?;

        let mut bytes = [0; 8];
        bytes.copy_from_slice(&selection_hash[0..8]);
        Ok(u64::from_le_bytes(bytes).safe_rem(modulo)? == 0)
    }

    /// Build the committee cache for `epoch`.
    ///
    /// The cache is not stored on the state; callers are expected to share it between requests.
    pub fn committee_cache_at(
        &self,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<std::sync::Arc<CommitteeCache>, Error> {
        CommitteeCache::initialized(self, epoch, spec)
    }
}

/// Returns a list of all `validators` indices where the validator is active at the given
/// `epoch`.
pub fn get_active_validator_indices(validators: &[Validator], epoch: Epoch) -> Vec<usize> {
    let mut active = Vec::with_capacity(validators.len());

    for (index, validator) in validators.iter().enumerate() {
        if validator.is_active_at(epoch) {
            active.push(index)
        }
    }

    active.shrink_to_fit();

    active
}

impl From<RelativeEpochError> for Error {
    fn from(e: RelativeEpochError) -> Error {
        Error::RelativeEpochError(e)
    }
}

impl From<ArithError> for Error {
    fn from(e: ArithError) -> Error {
        Error::ArithError(e)
    }
}
