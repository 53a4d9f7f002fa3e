//! Block trust arithmetic over compact-encoded targets.

use primitive_types::U256;

/// Expand a compact-encoded target ("nBits") into a 256-bit integer.
///
/// Returns `None` when the encoding carries the sign bit, has a zero
/// mantissa, or does not fit in 256 bits.
pub fn target_from_compact(bits: u32) -> Option<U256> {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x007f_ffff;
    if bits & 0x0080_0000 != 0 || mantissa == 0 {
        return None;
    }

    if exponent <= 3 {
        return Some(U256::from(mantissa >> (8 * (3 - exponent))));
    }

    let shift = 8 * (exponent - 3);
    if shift > 255 {
        return None;
    }
    let value = U256::from(mantissa);
    let target = value << shift;
    if target >> shift != value {
        return None;
    }
    Some(target)
}

/// Trust contributed by a single block: `(~target / (target + 1)) + 1`,
/// i.e. `2^256 / (target + 1)` without the overflowing numerator. Unset or
/// malformed targets contribute nothing.
pub fn block_trust(bits: u32) -> U256 {
    match target_from_compact(bits) {
        Some(target) if !target.is_zero() => (!target / (target + U256::one())) + U256::one(),
        _ => U256::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_expansion() {
        // 0x1d00ffff is the classic difficulty-1 target.
        let target = target_from_compact(0x1d00_ffff).expect("valid compact");
        assert_eq!(target, U256::from(0x00ff_ffu64) << 208);

        assert_eq!(target_from_compact(0x0100_0012), Some(U256::zero()));
        assert_eq!(target_from_compact(0x0400_0000), None);
        assert_eq!(target_from_compact(0x0480_0001), None);
        assert_eq!(target_from_compact(0xff7f_ffff), None);
    }

    #[test]
    fn trust_is_inverse_of_target() {
        // A permissive target contributes little trust, a strict one a lot.
        let easy = block_trust(0x207f_ffff);
        let hard = block_trust(0x1d00_ffff);
        assert!(easy < hard);
        assert!(!hard.is_zero());

        assert_eq!(block_trust(0), U256::zero());
        assert_eq!(block_trust(0x0080_0000), U256::zero());
    }

    #[test]
    fn trust_accumulates() {
        let one = block_trust(0x1f00_ffff);
        let sum = one + one + one;
        assert_eq!(sum, one * U256::from(3u8));
    }
}
