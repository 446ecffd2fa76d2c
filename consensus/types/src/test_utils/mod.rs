mod generate_deterministic_pubkeys;
mod testing_beacon_state_builder;

pub use generate_deterministic_pubkeys::{generate_deterministic_pubkeys, interop_pubkey};
pub use testing_beacon_state_builder::{TestingBeaconStateBuilder, INTEROP_RANDAO_MIX};
