use crate::builder::{BeaconChainBuilder, Witness};
use crate::canonical_head::BeaconSnapshot;
use crate::errors::{BeaconChainError, DutiesError};
use crate::sync_status::ManualSyncStatus;
use crate::{BeaconChain, ChainConfig};
use logging::test_logger;
use rayon::prelude::*;
use std::sync::Arc;
use store::{MemoryStore, ValidatorIndexStore};
use types::test_utils::{interop_pubkey, TestingBeaconStateBuilder};
use types::{BeaconState, ChainSpec, DutiesRequest, DutiesResponse, Epoch, EthSpec, Hash256, Slot};

pub type EphemeralHarnessType<E> = Witness<MemoryStore, ManualSyncStatus, E>;

type StateMutator<E> = Box<dyn FnOnce(&mut TestingBeaconStateBuilder<E>)>;

pub struct Builder<E: EthSpec> {
    spec: Option<ChainSpec>,
    chain_config: ChainConfig,
    validator_count: Option<usize>,
    head_slot: Slot,
    state_mutator: Option<StateMutator<E>>,
}

impl<E: EthSpec> Builder<E> {
    pub fn default_spec(self) -> Self {
        self.spec(E::default_spec())
    }

    pub fn spec(mut self, spec: ChainSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn chain_config(mut self, chain_config: ChainConfig) -> Self {
        self.chain_config = chain_config;
        self
    }

    /// The number of interop validators in the head state, all active from genesis.
    pub fn validator_count(mut self, validator_count: usize) -> Self {
        self.validator_count = Some(validator_count);
        self
    }

    /// Moves the head state to `slot` without any state transition.
    pub fn head_slot(mut self, slot: Slot) -> Self {
        self.head_slot = slot;
        self
    }

    /// Modify the head state before the chain is built, e.g. to exit some validators.
    pub fn mutate_state(
        mut self,
        f: impl FnOnce(&mut TestingBeaconStateBuilder<E>) + 'static,
    ) -> Self {
        self.state_mutator = Some(Box::new(f));
        self
    }

    pub fn build(self) -> BeaconChainHarness<E> {
        let spec = self.spec.expect("cannot build without a spec");
        let validator_count = self
            .validator_count
            .expect("cannot build without a validator count");

        let mut state_builder =
            TestingBeaconStateBuilder::from_deterministic_pubkeys(validator_count, &spec);
        state_builder.teleport_to_slot(self.head_slot);
        if let Some(mutator) = self.state_mutator {
            mutator(&mut state_builder);
        }
        let state = state_builder.build();

        let store = Arc::new(MemoryStore::open());
        populate_store(&store, &state);

        let sync_status = Arc::new(ManualSyncStatus::default());

        let chain = BeaconChainBuilder::new(E::default())
            .custom_spec(spec.clone())
            .chain_config(self.chain_config)
            .logger(test_logger())
            .store(store)
            .sync_status(sync_status.clone())
            .genesis_state(state)
            .build()
            .expect("should build chain");

        BeaconChainHarness {
            chain: Arc::new(chain),
            spec,
            sync_status,
        }
    }
}

/// Writes the index of every validator of `state` to `store`, from many threads at once.
pub fn populate_store<E: EthSpec>(store: &MemoryStore, state: &BeaconState<E>) {
    state
        .validators
        .par_iter()
        .enumerate()
        .try_for_each(|(index, validator)| store.put_validator_index(&validator.pubkey, index))
        .expect("should populate store");
}

/// A testing harness which can instantiate a `BeaconChain` whose head is an interop state.
///
/// Used for testing.
pub struct BeaconChainHarness<E: EthSpec> {
    pub chain: Arc<BeaconChain<EphemeralHarnessType<E>>>,
    pub spec: ChainSpec,
    pub sync_status: Arc<ManualSyncStatus>,
}

impl<E: EthSpec> BeaconChainHarness<E> {
    pub fn builder(_eth_spec_instance: E) -> Builder<E> {
        Builder {
            spec: None,
            chain_config: ChainConfig::default(),
            validator_count: None,
            head_slot: Slot::new(0),
            state_mutator: None,
        }
    }

    pub fn head_state(&self) -> BeaconState<E> {
        self.chain
            .head()
            .expect("should read head")
            .beacon_state
            .clone()
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.sync_status.set_syncing(syncing);
    }

    pub fn update_head(
        &self,
        block_root: Hash256,
        state: BeaconState<E>,
    ) -> Result<(), BeaconChainError> {
        self.chain.update_head(BeaconSnapshot::new(block_root, state))
    }

    /// Requests the duties of the interop validators with `validator_indices`.
    pub fn get_duties(
        &self,
        validator_indices: &[usize],
        epoch: Epoch,
    ) -> Result<DutiesResponse, DutiesError> {
        let request = DutiesRequest {
            pubkeys: validator_indices
                .iter()
                .map(|&i| interop_pubkey(i).as_serialized().to_vec())
                .collect(),
            epoch,
        };
        self.chain.get_duties(&request)
    }
}
