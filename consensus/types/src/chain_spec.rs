use crate::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Each of the domains used to derive seeds and selection proofs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Domain {
    BeaconProposer,
    BeaconAttester,
    SelectionProof,
}

/// Holds all the "constants" for a BeaconChain.
///
/// Values that are fixed per preset (e.g., `SLOTS_PER_EPOCH`) live on the `EthSpec` instead.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct ChainSpec {
    /*
     * Config name
     */
    pub config_name: Option<String>,

    /*
     * Misc
     */
    pub target_committee_size: usize,
    pub max_committees_per_slot: usize,
    pub shuffle_round_count: u8,
    pub target_aggregators_per_committee: u64,

    /*
     *  Gwei values
     */
    pub max_effective_balance: u64,

    /*
     * Initial Values
     */
    pub genesis_slot: Slot,
    pub far_future_epoch: Epoch,

    /*
     * Time parameters
     */
    pub min_seed_lookahead: Epoch,

    /*
     * Signature domains
     */
    #[serde(with = "serde_utils::u32_hex")]
    pub domain_beacon_proposer: u32,
    #[serde(with = "serde_utils::u32_hex")]
    pub domain_beacon_attester: u32,
    #[serde(with = "serde_utils::u32_hex")]
    pub domain_selection_proof: u32,
}

impl ChainSpec {
    /// Get the domain number, unmodified by the fork.
    pub fn get_domain_constant(&self, domain: Domain) -> u32 {
        match domain {
            Domain::BeaconProposer => self.domain_beacon_proposer,
            Domain::BeaconAttester => self.domain_beacon_attester,
            Domain::SelectionProof => self.domain_selection_proof,
        }
    }

    /// Returns a `ChainSpec` compatible with the Ethereum Foundation specification.
    pub fn mainnet() -> Self {
        Self {
            /*
             * Config name
             */
            config_name: Some("mainnet".to_string()),

            /*
             * Misc
             */
            target_committee_size: 128,
            max_committees_per_slot: 64,
            shuffle_round_count: 90,
            target_aggregators_per_committee: 16,

            /*
             *  Gwei values
             */
            max_effective_balance: 32_000_000_000,

            /*
             * Initial Values
             */
            genesis_slot: Slot::new(0),
            far_future_epoch: Epoch::new(u64::MAX),

            /*
             * Time parameters
             */
            min_seed_lookahead: Epoch::new(1),

            /*
             * Signature domains
             */
            domain_beacon_proposer: 0,
            domain_beacon_attester: 1,
            domain_selection_proof: 5,
        }
    }

    /// Ethereum Foundation minimal spec, as defined in the eth2.0-specs repo.
    pub fn minimal() -> Self {
        Self {
            config_name: Some("minimal".to_string()),
            target_committee_size: 4,
            max_committees_per_slot: 4,
            shuffle_round_count: 10,
            ..ChainSpec::mainnet()
        }
    }

    /// Load a `ChainSpec` from a YAML file. Missing keys take their mainnet values.
    pub fn from_file(filename: &Path) -> Result<Self, String> {
        File::open(filename)
            .map_err(|e| format!("Unable to open {}: {:?}", filename.display(), e))
            .and_then(|file| {
                serde_yaml::from_reader(file)
                    .map_err(|e| format!("Unable to parse {}: {:?}", filename.display(), e))
            })
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}
