//! Bit helpers for Gray-code kernel bookkeeping.

/// Returns the reflected binary Gray code of `value`.
#[inline]
pub(crate) fn gray_code(value: usize) -> usize {
    (value >> 1) ^ value
}

/// Counts the shared high-order bits of `a` and `b` within a `bits`-wide word.
///
/// Bits are compared from position `bits - 1` downwards; the count stops at
/// the first differing bit.
pub(crate) fn shared_prefix(a: usize, b: usize, bits: u32) -> u32 {
    let mut count = 0;
    while count < bits {
        let mask = 1usize << (bits - 1 - count);
        if a & mask != b & mask {
            break;
        }
        count += 1;
    }
    count
}

/// Reverses the lowest `bits` bits of `value`.
#[inline]
pub(crate) fn reverse_bits(value: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bits)
}

/// Returns `log2(value)` when `value` is a non-zero power of two.
#[inline]
pub(crate) fn exact_log2(value: usize) -> Option<u32> {
    if value.is_power_of_two() {
        Some(value.trailing_zeros())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{exact_log2, gray_code, reverse_bits, shared_prefix};

    #[test]
    fn gray_code_neighbours_differ_in_one_bit() {
        for value in 1..256usize {
            let diff = gray_code(value) ^ gray_code(value - 1);
            assert_eq!(diff.count_ones(), 1, "value {value}");
        }
        assert_eq!(gray_code(0), 0);
        assert_eq!(gray_code(5), 7);
    }

    #[test]
    fn shared_prefix_counts_from_the_top() {
        assert_eq!(shared_prefix(0b000, 0b001, 3), 2);
        assert_eq!(shared_prefix(0b011, 0b001, 3), 1);
        assert_eq!(shared_prefix(0b110, 0b010, 3), 0);
        assert_eq!(shared_prefix(0b101, 0b101, 3), 3);
        assert_eq!(shared_prefix(1, 0, 0), 0);
    }

    #[test]
    fn reverse_bits_handles_narrow_words() {
        assert_eq!(reverse_bits(0b001, 3), 0b100);
        assert_eq!(reverse_bits(0b110, 3), 0b011);
        assert_eq!(reverse_bits(1, 1), 1);
        assert_eq!(reverse_bits(7, 0), 0);
    }

    #[test]
    fn exact_log2_rejects_non_powers() {
        assert_eq!(exact_log2(1), Some(0));
        assert_eq!(exact_log2(16), Some(4));
        assert_eq!(exact_log2(0), None);
        assert_eq!(exact_log2(12), None);
    }
}
