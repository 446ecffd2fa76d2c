use promise_cache::PromiseCacheError;
use safe_arith::ArithError;
use std::fmt;
use store::Error as StoreError;
use types::*;

macro_rules! easy_from_to {
    ($from: ident, $to: ident) => {
        impl From<$from> for $to {
            fn from(e: $from) -> $to {
                $to::$from(e)
            }
        }
    };
}

#[derive(Debug, PartialEq)]
pub enum BeaconChainError {
    BeaconStateError(BeaconStateError),
    StoreError(StoreError),
    ShufflingCacheError(PromiseCacheError),
    ProposerCacheError(PromiseCacheError),
    ArithError(ArithError),
    /// The canonical head lock could not be obtained in time.
    UnableToReadHead,
    ShufflingCacheLockTimeout,
    ProposerCacheLockTimeout,
    /// The proposer cache returned a list that does not cover every slot of `epoch`.
    ProposerCacheIncorrectLength {
        epoch: Epoch,
        expected: usize,
        found: usize,
    },
    InvalidShufflingId {
        shuffling_epoch: Epoch,
        head_block_epoch: Epoch,
    },
}

easy_from_to!(BeaconStateError, BeaconChainError);
easy_from_to!(StoreError, BeaconChainError);
easy_from_to!(ArithError, BeaconChainError);

impl From<PromiseCacheError> for BeaconChainError {
    fn from(e: PromiseCacheError) -> Self {
        BeaconChainError::ShufflingCacheError(e)
    }
}

/// The errors a caller of `BeaconChain::get_duties` may observe.
#[derive(Debug, PartialEq)]
pub enum DutiesError {
    /// The node is syncing and its head cannot be trusted.
    NotReady,
    /// The key at position `index` of the request is not 48 bytes long.
    MalformedPublicKey {
        index: usize,
        length: usize,
    },
    /// No validator with this key is known.
    ValidatorNotFound(PublicKeyBytes),
    /// Duties are only served for the current and next epoch of the head.
    InvalidEpochRequest {
        request_epoch: Epoch,
        current_epoch: Epoch,
    },
    BeaconChainError(BeaconChainError),
}

easy_from_to!(BeaconChainError, DutiesError);

impl From<BeaconStateError> for DutiesError {
    fn from(e: BeaconStateError) -> Self {
        DutiesError::BeaconChainError(e.into())
    }
}

impl From<StoreError> for DutiesError {
    fn from(e: StoreError) -> Self {
        DutiesError::BeaconChainError(e.into())
    }
}

impl fmt::Display for DutiesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutiesError::NotReady => write!(f, "beacon node is syncing"),
            DutiesError::MalformedPublicKey { index, length } => write!(
                f,
                "incorrect key length: key {} has {} bytes, expected {}",
                index, length, PUBLIC_KEY_BYTES_LEN
            ),
            DutiesError::ValidatorNotFound(pubkey) => {
                write!(f, "validator {} does not exist", pubkey)
            }
            DutiesError::InvalidEpochRequest {
                request_epoch,
                current_epoch,
            } => write!(
                f,
                "epoch {} is not the current ({}) or next epoch",
                request_epoch, current_epoch
            ),
            DutiesError::BeaconChainError(e) => write!(f, "internal error: {:?}", e),
        }
    }
}

impl std::error::Error for DutiesError {}
