use super::generate_deterministic_pubkeys;
use crate::*;

/// The RANDAO mix every slot of an interop genesis state starts with.
pub const INTEROP_RANDAO_MIX: Hash256 = Hash256::new([0x42; 32]);

/// Builds a `BeaconState` for testing.
///
/// Every validator is active from genesis with the maximum effective balance, and has the key
/// `interop_pubkey(i)`.
pub struct TestingBeaconStateBuilder<E: EthSpec> {
    state: BeaconState<E>,
}

impl<E: EthSpec> TestingBeaconStateBuilder<E> {
    pub fn from_deterministic_pubkeys(validator_count: usize, spec: &ChainSpec) -> Self {
        let mut state = BeaconState::new(spec.genesis_slot, Fork::default());

        state.validators = generate_deterministic_pubkeys(validator_count)
            .into_iter()
            .map(|pubkey| {
                Validator::new_active(
                    pubkey,
                    spec.max_effective_balance,
                    spec.genesis_slot.epoch(E::slots_per_epoch()),
                    spec,
                )
            })
            .collect();
        state.randao_mixes = vec![INTEROP_RANDAO_MIX; E::epochs_per_historical_vector()];

        Self { state }
    }

    /// Sets the state slot without running any state transition.
    pub fn teleport_to_slot(&mut self, slot: Slot) -> &mut Self {
        self.state.slot = slot;
        self
    }

    /// Replaces every RANDAO mix with `f(i)`.
    pub fn fill_randao_mixes(&mut self, f: impl Fn(usize) -> Hash256) -> &mut Self {
        for (i, mix) in self.state.randao_mixes.iter_mut().enumerate() {
            *mix = f(i);
        }
        self
    }

    /// Gives mutable access to the validator registry, e.g. to exit or slash some validators.
    pub fn validators_mut(&mut self) -> &mut Vec<Validator> {
        &mut self.state.validators
    }

    pub fn build(self) -> BeaconState<E> {
        self.state
    }
}
