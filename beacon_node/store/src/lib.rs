//! Storage functionality for the beacon node.
//!
//! Provides the following:
//!
//! - `KeyValueStore`: a column-keyed byte store.
//! - `MemoryStore`: an in-memory, thread-safe `KeyValueStore`.
//! - `ValidatorIndexStore`: the public key to validator index mapping, implemented for every
//!   `KeyValueStore`.
mod errors;
mod memory_store;

pub use self::errors::{DBError, Error, Result};
pub use self::memory_store::MemoryStore;

use strum::{EnumIter, EnumString, IntoStaticStr};
use types::{BeaconState, EthSpec, PublicKeyBytes};

/// An object capable of storing and retrieving bytes under a column and key.
pub trait KeyValueStore: Sync + Send + Sized + 'static {
    /// Retrieve some bytes in `column` with `key`.
    fn get_bytes(&self, column: DBColumn, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store some `value` in `column`, indexed with `key`.
    fn put_bytes(&self, column: DBColumn, key: &[u8], value: &[u8]) -> Result<()>;

    /// Return `true` if `key` exists in `column`.
    fn key_exists(&self, column: DBColumn, key: &[u8]) -> Result<bool>;

    /// Removes `key` from `column`.
    fn key_delete(&self, column: DBColumn, key: &[u8]) -> Result<()>;
}

/// A unique column identifier.
#[derive(Debug, Clone, Copy, PartialEq, IntoStaticStr, EnumString, EnumIter)]
pub enum DBColumn {
    /// For the mapping from validator public keys to their index in the registry.
    #[strum(serialize = "pki")]
    PubkeyIndex,
}

impl DBColumn {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

/// Maps validator public keys to their index in the validator registry.
///
/// Implementations must be safe to write from many threads at once.
pub trait ValidatorIndexStore: Sync + Send + 'static {
    /// Returns the index of the validator with `pubkey`, if it is known.
    fn get_validator_index(&self, pubkey: &PublicKeyBytes) -> Result<Option<usize>>;

    /// Records that the validator with `pubkey` has index `validator_index`.
    fn put_validator_index(&self, pubkey: &PublicKeyBytes, validator_index: usize) -> Result<()>;

    /// Records the index of every validator in `state`.
    ///
    /// Keys that are already stored with the same index are skipped. A key stored with another
    /// index is an error, since public keys are unique in the registry.
    fn import_new_pubkeys<E: EthSpec>(&self, state: &BeaconState<E>) -> Result<()> {
        for (validator_index, validator) in state.validators.iter().enumerate() {
            match self.get_validator_index(&validator.pubkey)? {
                Some(existing_index) if existing_index == validator_index => continue,
                Some(existing_index) => {
                    return Err(Error::DuplicateValidatorPublicKey {
                        pubkey: validator.pubkey,
                        existing_index,
                        new_index: validator_index,
                    })
                }
                None => self.put_validator_index(&validator.pubkey, validator_index)?,
            }
        }
        Ok(())
    }
}

impl<T: KeyValueStore> ValidatorIndexStore for T {
    fn get_validator_index(&self, pubkey: &PublicKeyBytes) -> Result<Option<usize>> {
        self.get_bytes(DBColumn::PubkeyIndex, pubkey.as_serialized())?
            .map(|bytes| {
                let array: [u8; 8] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| Error::InvalidBytes {
                            column: DBColumn::PubkeyIndex.as_str(),
                            length: bytes.len(),
                        })?;
                Ok(u64::from_le_bytes(array) as usize)
            })
            .transpose()
    }

    fn put_validator_index(&self, pubkey: &PublicKeyBytes, validator_index: usize) -> Result<()> {
        self.put_bytes(
            DBColumn::PubkeyIndex,
            pubkey.as_serialized(),
            &(validator_index as u64).to_le_bytes(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
    use std::thread;
    use types::test_utils::{interop_pubkey, TestingBeaconStateBuilder};
    use types::{ChainSpec, MinimalEthSpec};

    #[test]
    fn column_names() {
        assert_eq!(DBColumn::PubkeyIndex.as_str(), "pki");
        assert_eq!("pki".parse::<DBColumn>(), Ok(DBColumn::PubkeyIndex));
    }

    #[test]
    fn put_and_get() {
        let store = MemoryStore::open();
        let pubkey = interop_pubkey(7);

        assert_eq!(store.get_validator_index(&pubkey), Ok(None));
        store.put_validator_index(&pubkey, 7).unwrap();
        assert_eq!(store.get_validator_index(&pubkey), Ok(Some(7)));
        assert_eq!(store.get_validator_index(&interop_pubkey(8)), Ok(None));

        store
            .key_delete(DBColumn::PubkeyIndex, pubkey.as_serialized())
            .unwrap();
        assert_eq!(store.get_validator_index(&pubkey), Ok(None));
    }

    #[test]
    fn corrupt_index_bytes() {
        let store = MemoryStore::open();
        let pubkey = interop_pubkey(0);

        store
            .put_bytes(DBColumn::PubkeyIndex, pubkey.as_serialized(), &[1, 2, 3])
            .unwrap();
        assert_eq!(
            store.get_validator_index(&pubkey),
            Err(Error::InvalidBytes {
                column: "pki",
                length: 3
            })
        );
    }

    #[test]
    fn import_new_pubkeys() {
        let spec = ChainSpec::minimal();
        let store = MemoryStore::open();

        let state =
            TestingBeaconStateBuilder::<MinimalEthSpec>::from_deterministic_pubkeys(10, &spec)
                .build();
        store.import_new_pubkeys(&state).unwrap();
        assert_eq!(store.len(), 10);

        // Importing a larger registry only adds the new keys.
        let state =
            TestingBeaconStateBuilder::<MinimalEthSpec>::from_deterministic_pubkeys(16, &spec)
                .build();
        store.import_new_pubkeys(&state).unwrap();
        assert_eq!(store.len(), 16);

        for i in 0..16 {
            assert_eq!(store.get_validator_index(&interop_pubkey(i)), Ok(Some(i)));
        }
    }

    #[test]
    fn import_rejects_moved_pubkey() {
        let spec = ChainSpec::minimal();
        let store = MemoryStore::open();
        store.put_validator_index(&interop_pubkey(3), 4).unwrap();

        let state =
            TestingBeaconStateBuilder::<MinimalEthSpec>::from_deterministic_pubkeys(8, &spec)
                .build();
        assert_eq!(
            store.import_new_pubkeys(&state),
            Err(Error::DuplicateValidatorPublicKey {
                pubkey: interop_pubkey(3),
                existing_index: 4,
                new_index: 3,
            })
        );
    }

    #[test]
    fn concurrent_writers_are_all_visible() {
        let store = MemoryStore::open();
        let num_threads = 8;
        let per_thread = 512;

        thread::scope(|s| {
            for t in 0..num_threads {
                let store = &store;
                s.spawn(move || {
                    let mut indices = (t * per_thread..(t + 1) * per_thread).collect::<Vec<_>>();
                    indices.shuffle(&mut StdRng::seed_from_u64(t as u64));
                    for i in indices {
                        store.put_validator_index(&interop_pubkey(i), i).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.len(), num_threads * per_thread);
        for i in 0..num_threads * per_thread {
            assert_eq!(store.get_validator_index(&interop_pubkey(i)), Ok(Some(i)));
        }
    }
}
