use crate::{swap_bit, Buf, MAX_LIST_SIZE, SEED_SIZE};

/// Shuffles an entire list in-place.
///
/// Note: this is equivalent to the `compute_shuffled_index` function, except it shuffles an entire
/// list not just a single index. With large lists this function has been observed to be 250x
/// faster than running `compute_shuffled_index` across an entire list.
///
/// Credits to [@protolambda](https://github.com/protolambda) for defining this algorithm.
///
/// Shuffles if `forwards == true`, otherwise un-shuffles.
/// It holds that: shuffle_list(shuffle_list(l, r, s, true), r, s, false) == l
///           and: shuffle_list(shuffle_list(l, r, s, false), r, s, true) == l
///
/// With `forwards == false` the output satisfies
/// `output[i] == input[compute_shuffled_index(i, input.len(), seed, rounds)]`, which is the
/// ordering committees are sliced from.
///
/// Returns `None` under any of the following conditions:
///  - `list_size == 0`
///  - `list_size > 2**24`
///  - `seed.len() != 32`
///  - `rounds == 0`
pub fn shuffle_list(
    mut input: Vec<usize>,
    rounds: u8,
    seed: &[u8],
    forwards: bool,
) -> Option<Vec<usize>> {
    let list_size = input.len();

    if input.is_empty() || list_size > MAX_LIST_SIZE || seed.len() != SEED_SIZE || rounds == 0 {
        return None;
    }

    let mut buf = Buf::new(seed);

    let mut r = if forwards { 0 } else { rounds - 1 };

    loop {
        buf.set_round(r);

        let pivot = buf.raw_pivot() as usize % list_size;

        // Swap the lower half, mirrored around `pivot / 2`.
        let mirror = (pivot + 1) >> 1;

        buf.mix_in_position(pivot >> 8);
        let mut source = buf.hash();

        for i in 0..mirror {
            let j = pivot - i;

            if j & 0xff == 0xff {
                buf.mix_in_position(j >> 8);
                source = buf.hash();
            }

            if swap_bit(&source, j) {
                input.swap(i, j);
            }
        }

        // Swap the upper half, mirrored around `(pivot + list_size) / 2`.
        let mirror = (pivot + list_size + 1) >> 1;
        let end = list_size - 1;

        buf.mix_in_position(end >> 8);
        let mut source = buf.hash();

        for (loop_iter, i) in ((pivot + 1)..mirror).enumerate() {
            let j = end - loop_iter;

            if j & 0xff == 0xff {
                buf.mix_in_position(j >> 8);
                source = buf.hash();
            }

            if swap_bit(&source, j) {
                input.swap(i, j);
            }
        }

        if forwards {
            r += 1;
            if r == rounds {
                break;
            }
        } else {
            if r == 0 {
                break;
            }
            r -= 1;
        }
    }

    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_shuffled_index;

    fn seed(byte: u8) -> [u8; 32] {
        ethereum_hashing::hash_fixed(&[byte])
    }

    #[test]
    fn returns_none_for_zero_length_list() {
        assert_eq!(None, shuffle_list(vec![], 90, &seed(0), true));
    }

    #[test]
    fn returns_none_for_zero_rounds() {
        assert_eq!(None, shuffle_list(vec![1, 2, 3], 0, &seed(0), true));
    }

    #[test]
    fn returns_none_for_bad_seed() {
        assert_eq!(None, shuffle_list(vec![1, 2, 3], 90, &[42, 42], true));
    }

    #[test]
    fn matches_compute_shuffled_index() {
        for list_size in [1, 2, 3, 10, 64, 255, 256, 257, 300, 1_000] {
            let seed = seed(list_size as u8);
            let input = (0..list_size).collect::<Vec<_>>();

            let shuffled = shuffle_list(input.clone(), 90, &seed, false).unwrap();
            let expected = (0..list_size)
                .map(|i| input[compute_shuffled_index(i, list_size, &seed, 90).unwrap()])
                .collect::<Vec<_>>();

            assert_eq!(shuffled, expected, "list_size {}", list_size);
        }
    }

    #[test]
    fn forwards_inverts_backwards() {
        let input = (100..612).collect::<Vec<usize>>();
        let seed = seed(7);

        let backwards = shuffle_list(input.clone(), 90, &seed, false).unwrap();
        assert_ne!(backwards, input);
        assert_eq!(shuffle_list(backwards, 90, &seed, true).unwrap(), input);

        let forwards = shuffle_list(input.clone(), 90, &seed, true).unwrap();
        assert_eq!(shuffle_list(forwards, 90, &seed, false).unwrap(), input);
    }

    #[test]
    fn different_seeds_give_different_shuffles() {
        let input = (0..128).collect::<Vec<usize>>();
        let a = shuffle_list(input.clone(), 90, &seed(1), false).unwrap();
        let b = shuffle_list(input, 90, &seed(2), false).unwrap();
        assert_ne!(a, b);
    }
}
