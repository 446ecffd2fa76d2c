use crate::{swap_bit, Buf, MAX_LIST_SIZE, SEED_SIZE};

/// Return `p(index)` in a pseudorandom permutation `p` of `0...list_size-1` with ``seed`` as entropy.
///
/// Utilizes 'swap or not' shuffling found in
/// https://link.springer.com/content/pdf/10.1007%2F978-3-642-32009-5_1.pdf
/// See the 'generalized domain' algorithm on page 3.
///
/// Note: this function is significantly slower than the `shuffle_list` function in this crate.
/// Using `compute_shuffled_index` to shuffle an entire list, index by index, has been observed to
/// be 250x slower than `shuffle_list`. Therefore, this function is only useful when shuffling a
/// small portion of a much larger list.
///
/// Returns `None` under any of the following conditions:
///  - `list_size == 0`
///  - `index >= list_size`
///  - `list_size > 2**24`
///  - `seed.len() != 32`
pub fn compute_shuffled_index(
    index: usize,
    list_size: usize,
    seed: &[u8],
    shuffle_round_count: u8,
) -> Option<usize> {
    if list_size == 0 || index >= list_size || list_size > MAX_LIST_SIZE || seed.len() != SEED_SIZE
    {
        return None;
    }

    let mut buf = Buf::new(seed);
    let mut index = index;
    for round in 0..shuffle_round_count {
        buf.set_round(round);
        let pivot = buf.raw_pivot() as usize % list_size;
        index = do_round(&mut buf, index, pivot, list_size);
    }
    Some(index)
}

fn do_round(buf: &mut Buf, index: usize, pivot: usize, list_size: usize) -> usize {
    let flip = (pivot + (list_size - index)) % list_size;
    let position = std::cmp::max(index, flip);
    buf.mix_in_position(position >> 8);
    if swap_bit(&buf.hash(), position) {
        flip
    } else {
        index
    }
}
