use types::{BeaconStateError, PublicKeyBytes};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    BeaconStateError(BeaconStateError),
    DBError {
        message: String,
    },
    /// The bytes stored under some key could not be decoded.
    InvalidBytes {
        column: &'static str,
        length: usize,
    },
    /// A public key is already mapped to a different validator index.
    DuplicateValidatorPublicKey {
        pubkey: PublicKeyBytes,
        existing_index: usize,
        new_index: usize,
    },
}

impl From<BeaconStateError> for Error {
    fn from(e: BeaconStateError) -> Error {
        Error::BeaconStateError(e)
    }
}

#[derive(Debug)]
pub struct DBError {
    pub message: String,
}

impl DBError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl From<DBError> for Error {
    fn from(e: DBError) -> Error {
        Error::DBError { message: e.message }
    }
}
