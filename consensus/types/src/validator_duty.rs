use crate::*;
use serde::{Deserialize, Serialize};

/// The status of a validator at the epoch for which duties were requested.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    /// The activation epoch lies in the future.
    Pending,
    Active,
    /// Active, but slashed. Duties are still assigned until the exit epoch.
    Slashed,
    Exited,
}

impl ValidatorStatus {
    pub fn from_validator(validator: &Validator, epoch: Epoch) -> Self {
        if validator.is_active_at(epoch) {
            if validator.slashed {
                ValidatorStatus::Slashed
            } else {
                ValidatorStatus::Active
            }
        } else if epoch < validator.activation_epoch {
            ValidatorStatus::Pending
        } else {
            ValidatorStatus::Exited
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, ValidatorStatus::Active | ValidatorStatus::Slashed)
    }
}

/// The duties of a single validator for one epoch.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ValidatorDuty {
    /// The validator's index in `state.validators`.
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: u64,
    /// The validator's BLS public key, uniquely identifying them.
    pub pubkey: PublicKeyBytes,
    pub status: ValidatorStatus,
    /// The slot at which the validator must attest.
    pub attester_slot: Option<Slot>,
    /// The index of the committee within `slot` of which the validator is a member.
    pub committee_index: Option<CommitteeIndex>,
    /// The position of the validator in the committee.
    pub committee_position: Option<usize>,
    /// The committee count at `attester_slot`.
    #[serde(with = "serde_utils::quoted_u64")]
    pub committees_at_slot: u64,
    /// The members of the committee, in committee order.
    #[serde(with = "serde_utils::quoted_u64_vec")]
    pub committee: Vec<u64>,
    /// Whether the validator must aggregate the attestations of its committee.
    pub is_aggregator: bool,
    /// The slots in which the validator must propose a block.
    pub proposer_slots: Vec<Slot>,
}

impl ValidatorDuty {
    /// A duty for a validator that has no attestation duties in the epoch.
    pub fn no_duties(
        validator_index: u64,
        pubkey: PublicKeyBytes,
        status: ValidatorStatus,
    ) -> Self {
        Self {
            validator_index,
            pubkey,
            status,
            attester_slot: None,
            committee_index: None,
            committee_position: None,
            committees_at_slot: 0,
            committee: vec![],
            is_aggregator: false,
            proposer_slots: vec![],
        }
    }
}

/// A block proposal duty.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ProposerDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: u64,
    pub slot: Slot,
}

/// A request for the duties of a batch of public keys.
///
/// Keys are kept as raw bytes so that malformed keys can be reported by their position in the
/// batch.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct DutiesRequest {
    #[serde(with = "hex_bytes_list")]
    pub pubkeys: Vec<Vec<u8>>,
    pub epoch: Epoch,
}

/// Duties for every key of a `DutiesRequest`, in request order.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct DutiesResponse {
    pub epoch: Epoch,
    /// The block root the shuffling of `epoch` was decided by.
    pub dependent_root: Hash256,
    pub duties: Vec<ValidatorDuty>,
}

/// Serializes a list of byte vectors as `0x`-prefixed hex strings.
mod hex_bytes_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter().map(|bytes| format!("0x{}", hex::encode(bytes))))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| {
                let stripped = s
                    .strip_prefix("0x")
                    .ok_or_else(|| D::Error::custom("hex string must be 0x-prefixed"))?;
                hex::decode(stripped).map_err(D::Error::custom)
            })
            .collect()
    }
}
