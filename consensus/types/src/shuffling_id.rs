use crate::*;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Can be used to key (ID) the shuffling in some chain, in some epoch.
///
/// ## Reasoning
///
/// We say that the ID of some shuffling is always equal to a 2-tuple:
///
/// - The epoch for which the shuffling should be effective.
/// - A block root, where this is the root of the block from which the state used to compute the
///   shuffling was taken.
///
/// Two requests for different epochs never share a shuffling, even if they are served from the
/// same state.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct ShufflingId {
    pub shuffling_epoch: Epoch,
    pub shuffling_decision_block: Hash256,
}

impl ShufflingId {
    pub fn new(shuffling_decision_block: Hash256, shuffling_epoch: Epoch) -> Self {
        Self {
            shuffling_epoch,
            shuffling_decision_block,
        }
    }

    pub fn from_components(shuffling_epoch: Epoch, shuffling_decision_block: Hash256) -> Self {
        Self::new(shuffling_decision_block, shuffling_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn epochs_and_roots_are_distinct_keys() {
        let root_a = Hash256::repeat_byte(1);
        let root_b = Hash256::repeat_byte(2);

        let ids = [
            ShufflingId::new(root_a, Epoch::new(0)),
            ShufflingId::new(root_a, Epoch::new(1)),
            ShufflingId::new(root_b, Epoch::new(0)),
            ShufflingId::from_components(Epoch::new(0), root_a),
        ]
        .into_iter()
        .collect::<HashSet<_>>();

        assert_eq!(ids.len(), 3);
    }
}
