//! Types for deriving the duties of validators on the beacon chain.

pub mod test_utils;

pub mod attestation_duty;
pub mod beacon_committee;
pub mod beacon_state;
pub mod chain_spec;
pub mod eth_spec;
pub mod fork;
pub mod public_key_bytes;
pub mod relative_epoch;
pub mod shuffling_id;
pub mod slot_epoch;
pub mod validator;
pub mod validator_duty;

pub use crate::attestation_duty::AttestationDuty;
pub use crate::beacon_committee::{BeaconCommittee, OwnedBeaconCommittee};
pub use crate::beacon_state::{
    compute_committee_index_in_epoch, compute_committee_range_in_epoch, epoch_committee_count,
    get_active_validator_indices, BeaconState, CommitteeCache, Error as BeaconStateError,
};
pub use crate::chain_spec::{ChainSpec, Domain};
pub use crate::eth_spec::{EthSpec, EthSpecId, MainnetEthSpec, MinimalEthSpec};
pub use crate::fork::Fork;
pub use crate::public_key_bytes::{
    Error as PublicKeyBytesError, PublicKeyBytes, PUBLIC_KEY_BYTES_LEN,
};
pub use crate::relative_epoch::{Error as RelativeEpochError, RelativeEpoch};
pub use crate::shuffling_id::ShufflingId;
pub use crate::slot_epoch::{Epoch, Slot};
pub use crate::validator::Validator;
pub use crate::validator_duty::{
    DutiesRequest, DutiesResponse, ProposerDuty, ValidatorDuty, ValidatorStatus,
};

pub type CommitteeIndex = u64;
pub type Hash256 = alloy_primitives::B256;
