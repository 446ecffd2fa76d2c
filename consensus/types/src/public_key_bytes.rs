use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The byte-length of a BLS public key when serialized in compressed form.
pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    InvalidByteLength { got: usize, expected: usize },
    InvalidHex(String),
}

/// A serialized BLS public key.
///
/// The bytes are never decompressed or checked to be a valid point. They are only used as an
/// identity to look up a validator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKeyBytes([u8; PUBLIC_KEY_BYTES_LEN]);

impl PublicKeyBytes {
    /// Instantiates `Self` from exactly 48 bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_BYTES_LEN {
            return Err(Error::InvalidByteLength {
                got: bytes.len(),
                expected: PUBLIC_KEY_BYTES_LEN,
            });
        }
        let mut pubkey = [0; PUBLIC_KEY_BYTES_LEN];
        pubkey.copy_from_slice(bytes);
        Ok(Self(pubkey))
    }

    /// Returns `self.serialize()` as a `0x`-prefixed hex string.
    pub fn as_hex_string(&self) -> String {
        format!("{:?}", self)
    }

    pub fn serialize(&self) -> [u8; PUBLIC_KEY_BYTES_LEN] {
        self.0
    }

    pub fn as_serialized(&self) -> &[u8] {
        &self.0
    }

    /// Returns an all-zero key. Never a valid BLS point, used as a placeholder in tests.
    pub fn empty() -> Self {
        Self([0; PUBLIC_KEY_BYTES_LEN])
    }
}

impl From<[u8; PUBLIC_KEY_BYTES_LEN]> for PublicKeyBytes {
    fn from(bytes: [u8; PUBLIC_KEY_BYTES_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for PublicKeyBytes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }
}

impl Serialize for PublicKeyBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_hex_string())
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid pubkey ({:?})", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_lengths() {
        assert_eq!(
            PublicKeyBytes::deserialize(&[1, 2, 3]),
            Err(Error::InvalidByteLength {
                got: 3,
                expected: 48
            })
        );
        assert!(PublicKeyBytes::deserialize(&[0; 49]).is_err());
        assert!(PublicKeyBytes::deserialize(&[7; 48]).is_ok());
    }

    #[test]
    fn hex_string() {
        let pubkey = PublicKeyBytes::from([0xab; 48]);
        let string = pubkey.to_string();

        assert!(string.starts_with("0xabab"));
        assert_eq!(string.len(), 2 + 96);
        assert_eq!(string.parse::<PublicKeyBytes>(), Ok(pubkey));
        assert_eq!(string[2..].parse::<PublicKeyBytes>(), Ok(pubkey));
        assert!(matches!(
            "0xzz".parse::<PublicKeyBytes>(),
            Err(Error::InvalidHex(_))
        ));
    }

    #[test]
    fn serde_json() {
        let pubkey = PublicKeyBytes::from([1; 48]);
        let json = serde_json::to_string(&pubkey).unwrap();

        assert_eq!(json, format!("\"{}\"", pubkey));
        assert_eq!(serde_json::from_str::<PublicKeyBytes>(&json).unwrap(), pubkey);
        assert!(serde_json::from_str::<PublicKeyBytes>("\"0x0101\"").is_err());
    }
}
