use crate::{PublicKeyBytes, PUBLIC_KEY_BYTES_LEN};
use ethereum_hashing::hash_fixed;

/// Returns a public key for the validator at `index`.
///
/// The bytes are `hash(index) ‖ hash(hash(index))[..16]`. They are stable across runs but are not
/// valid BLS points.
pub fn interop_pubkey(index: usize) -> PublicKeyBytes {
    let first = hash_fixed(&(index as u64).to_le_bytes());
    let second = hash_fixed(&first);

    let mut bytes = [0; PUBLIC_KEY_BYTES_LEN];
    bytes[..32].copy_from_slice(&first);
    bytes[32..].copy_from_slice(&second[..PUBLIC_KEY_BYTES_LEN - 32]);
    PublicKeyBytes::from(bytes)
}

/// Generates `validator_count` public keys, where the key at index `i` is `interop_pubkey(i)`.
pub fn generate_deterministic_pubkeys(validator_count: usize) -> Vec<PublicKeyBytes> {
    (0..validator_count).map(interop_pubkey).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deterministic_and_unique() {
        let keys = generate_deterministic_pubkeys(1_000);

        assert_eq!(keys[42], interop_pubkey(42));
        assert_eq!(keys.iter().collect::<HashSet<_>>().len(), keys.len());
    }
}
