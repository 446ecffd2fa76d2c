//! Provides list-shuffling functions matching the Ethereum consensus specification.
//!
//! See
//! [compute_shuffled_index](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#compute_shuffled_index)
//! for specifications.
//!
//! There are two functions exported by this crate:
//!
//! - `compute_shuffled_index`: given a single index, computes the index resulting from a shuffle.
//!   Runs in less time than it takes to run `shuffle_list`.
//! - `shuffle_list`: shuffles an entire list in-place. Runs in less time than it takes to run
//!   `compute_shuffled_index` on each index.
//!
//! In general, use `compute_shuffled_index` to calculate the shuffling of a small subset of a much
//! larger list (~250x larger is a good guide, but solid figures yet to be calculated).

mod compute_shuffled_index;
mod shuffle_list;

pub use compute_shuffled_index::compute_shuffled_index;
pub use shuffle_list::shuffle_list;

/// Both functions refuse to operate on lists larger than this.
pub const MAX_LIST_SIZE: usize = 1 << 24;

const SEED_SIZE: usize = 32;
const ROUND_SIZE: usize = 1;
const POSITION_WINDOW_SIZE: usize = 4;
const PIVOT_VIEW_SIZE: usize = SEED_SIZE + ROUND_SIZE;
const TOTAL_SIZE: usize = SEED_SIZE + ROUND_SIZE + POSITION_WINDOW_SIZE;

/// The hash preimage used by both shuffling functions: `seed ‖ round ‖ position_window`.
struct Buf([u8; TOTAL_SIZE]);

impl Buf {
    /// Create a new buffer from the given `seed`.
    ///
    /// ## Panics
    ///
    /// Panics if `seed.len() != 32`.
    fn new(seed: &[u8]) -> Self {
        let mut buf = [0; TOTAL_SIZE];
        buf[0..SEED_SIZE].copy_from_slice(seed);
        Self(buf)
    }

    fn set_round(&mut self, round: u8) {
        self.0[SEED_SIZE] = round;
    }

    /// Returns the new pivot. It is "raw" because it has not modulo the list size (this must be
    /// done by the caller).
    fn raw_pivot(&self) -> u64 {
        let digest = ethereum_hashing::hash_fixed(&self.0[0..PIVOT_VIEW_SIZE]);

        let mut bytes = [0; std::mem::size_of::<u64>()];
        bytes[..].copy_from_slice(&digest[0..std::mem::size_of::<u64>()]);
        u64::from_le_bytes(bytes)
    }

    /// Add the current position into the buffer.
    fn mix_in_position(&mut self, position: usize) {
        self.0[PIVOT_VIEW_SIZE..].copy_from_slice(&(position as u32).to_le_bytes());
    }

    /// Hash the entire buffer.
    fn hash(&self) -> [u8; 32] {
        ethereum_hashing::hash_fixed(&self.0)
    }
}

/// Returns the swap bit for `position` from a `source` hash that covers it.
#[inline]
fn swap_bit(source: &[u8; 32], position: usize) -> bool {
    let byte = source[(position & 0xff) >> 3];
    (byte >> (position & 0x07)) & 0x01 == 1
}
