//! Bit mask helpers shared by the IPv4 math and the stego bitstream.

/// Mask of the `n_bits` least significant bits. Saturates at 64 bits.
pub fn mask(n_bits: u32) -> u64 {
    if n_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << n_bits) - 1
    }
}

/// Split `n` at `shift` bits (clamped to 0..=8), returning the high and low parts.
pub fn split(n: u64, shift: i32) -> (u64, u64) {
    let shift = shift.clamp(0, 8) as u32;
    (n >> shift, n & mask(shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(3), 0b111);
        assert_eq!(mask(8), 0xFF);
        assert_eq!(mask(32), u32::MAX as u64);
        assert_eq!(mask(64), u64::MAX);
        assert_eq!(mask(100), u64::MAX);
    }

    #[test]
    fn test_split() {
        assert_eq!(split(0xFF, 4), (0xF, 0xF));
        assert_eq!(split(0xFF, 0), (0xFF, 0x0));
        assert_eq!(split(0xFF, 8), (0x0, 0xFF));
        assert_eq!(split(0xFF, -1), (0xFF, 0x0));
        assert_eq!(split(0xFF, 12), (0x0, 0xFF));
    }
}
