// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
bit tricks for sizes and addresses.
*/

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two.  Returns `None` on overflow.
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    debug_assert!(alignment.is_power_of_two(), "alignment {alignment} is not a power of two");
    let mask = alignment - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

/// Next power of two at or above `value`, or `None` if that does not fit in a u64.
pub fn next_pow2(value: u64) -> Option<u64> {
    value.checked_next_power_of_two()
}

/// Forward bit scan: index of the lowest set bit.
///
/// For a power of two this is its log2.  Zero has no set bit.
pub fn bit_scan_forward(value: u64) -> Option<u32> {
    if value == 0 {
        None
    } else {
        Some(value.trailing_zeros())
    }
}

/// log2 of a power of two.
pub fn log2(power_of_two: u64) -> u32 {
    debug_assert!(power_of_two.is_power_of_two());
    power_of_two.trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 16), Some(0));
        assert_eq!(align_up(1, 16), Some(16));
        assert_eq!(align_up(256, 16), Some(256));
        assert_eq!(align_up(257, 256), Some(512));
        assert_eq!(align_up(u64::MAX, 2), None);
    }

    #[test]
    fn next_pow2_edges() {
        assert_eq!(next_pow2(1), Some(1));
        assert_eq!(next_pow2(272), Some(512));
        assert_eq!(next_pow2(4096), Some(4096));
        assert_eq!(next_pow2(u64::MAX), None);
    }

    #[test]
    fn scan() {
        assert_eq!(bit_scan_forward(0), None);
        assert_eq!(bit_scan_forward(1), Some(0));
        assert_eq!(bit_scan_forward(0b1000), Some(3));
        assert_eq!(log2(64 * 1024), 16);
    }
}
