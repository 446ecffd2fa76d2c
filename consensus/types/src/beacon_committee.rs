use crate::*;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct BeaconCommittee<'a> {
    pub slot: Slot,
    pub index: CommitteeIndex,
    pub committee: &'a [usize],
}

impl<'a> BeaconCommittee<'a> {
    pub fn into_owned(self) -> OwnedBeaconCommittee {
        OwnedBeaconCommittee {
            slot: self.slot,
            index: self.index,
            committee: self.committee.to_vec(),
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedBeaconCommittee {
    pub slot: Slot,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: CommitteeIndex,
    #[serde(with = "quoted_usize_vec")]
    pub committee: Vec<usize>,
}

/// Serializes a `Vec<usize>` as a list of quoted decimal strings.
mod quoted_usize_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[usize], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| s.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_owned_serializes_quoted() {
        let members = [3, 1, 2];
        let committee = BeaconCommittee {
            slot: Slot::new(9),
            index: 1,
            committee: &members,
        }
        .into_owned();

        let json = serde_json::to_string(&committee).unwrap();
        assert_eq!(
            json,
            r#"{"slot":"9","index":"1","committee":["3","1","2"]}"#
        );
        assert_eq!(
            serde_json::from_str::<OwnedBeaconCommittee>(&json).unwrap(),
            committee
        );
    }
}
