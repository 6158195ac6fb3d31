//! IBM System/360 base-16 floating point.
//!
//! SEG-Y format code 1 stores samples as sign, 7-bit excess-64 base-16
//! exponent and 24-bit mantissa. Conversion to and from IEEE-754 single
//! precision is pure bit manipulation on `u32` patterns; the bit patterns
//! here are in native order, byte-order handling happens in the sample
//! codec before these run.
//!
//! Policy: IBM zero maps to IEEE zero, exponent overflow saturates to the
//! largest finite float of the same sign (never Inf/NaN), underflow flushes
//! to zero (no subnormals are produced). Round-trip identity holds at the
//! IBM representation, which is coarser than IEEE.

const MANTISSA_MASK: u32 = 0x00ff_ffff;
const MANTISSA_TOP_BIT: u32 = 0x0080_0000;
const SIGN_MASK: u32 = 0x8000_0000;
const IEEE_MAX_FINITE: u32 = 0x7f7f_ffff;

/// Converts one IBM bit pattern to the equivalent IEEE-754 bit pattern.
pub fn to_ieee_bits(ibm: u32) -> u32 {
    let mut mantissa = ibm & MANTISSA_MASK;
    // A zero mantissa must never enter the normalization loop, whatever the
    // exponent byte says.
    if mantissa == 0 {
        return 0;
    }
    // Excess-64 base-16 exponent fused into an IEEE unbiased-exponent
    // accumulator: ((e - 64) * 4 + 127) - 1 = the biased exponent once the
    // mantissa's top bit has been shifted into place.
    let mut exponent = ((ibm & 0x7f00_0000) >> 22) as i32 - 130;
    while mantissa & MANTISSA_TOP_BIT == 0 {
        mantissa <<= 1;
        exponent -= 1;
    }
    if exponent > 254 {
        (ibm & SIGN_MASK) | IEEE_MAX_FINITE
    } else if exponent <= 0 {
        0
    } else {
        (ibm & SIGN_MASK) | ((exponent as u32) << 23) | (mantissa & 0x007f_ffff)
    }
}

/// Converts one IEEE-754 bit pattern to the equivalent IBM bit pattern.
pub fn from_ieee_bits(ieee: u32) -> u32 {
    if ieee & !SIGN_MASK == 0 {
        return 0;
    }
    // Reinsert the implicit leading 1, then round the binary exponent up to
    // a multiple of 4 by right-shifting so it rebases cleanly to base 16.
    let mut mantissa = (ieee & 0x007f_ffff) | MANTISSA_TOP_BIT;
    let mut exponent = ((ieee >> 23) & 0xff) as i32 - 126;
    while exponent & 0x3 != 0 {
        exponent += 1;
        mantissa >>= 1;
    }
    (ieee & SIGN_MASK) | ((((exponent >> 2) + 64) as u32) << 24) | mantissa
}

/// Decodes one IBM bit pattern to an `f32`.
#[inline]
pub fn to_f32(ibm: u32) -> f32 {
    f32::from_bits(to_ieee_bits(ibm))
}

/// Encodes an `f32` as an IBM bit pattern.
#[inline]
pub fn from_f32(value: f32) -> u32 {
    from_ieee_bits(value.to_bits())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_maps_to_zero() {
        assert_eq!(to_f32(0), 0.0);
        assert_eq!(from_f32(0.0), 0);
        assert_eq!(from_f32(-0.0), 0);
        // Nonzero exponent byte with a zero mantissa must not hang.
        assert_eq!(to_ieee_bits(0x4100_0000), 0);
        assert_eq!(to_ieee_bits(0x8000_0000), 0);
    }

    #[test]
    fn known_patterns() {
        // 1.0 = 16^1 * 0x10_0000/0x100_0000
        assert_eq!(to_f32(0x4110_0000), 1.0);
        assert_eq!(from_f32(1.0), 0x4110_0000);
        // 0.5 = 16^0 * 0x80_0000/0x100_0000
        assert_eq!(to_f32(0x4080_0000), 0.5);
        assert_eq!(from_f32(0.5), 0x4080_0000);
        // -118.625, the classic worked example for this format
        assert_eq!(to_f32(0xC276_A000), -118.625);
        assert_eq!(from_f32(-118.625), 0xC276_A000);
        assert_eq!(to_f32(0x4110_0000u32 | SIGN_MASK), -1.0);
    }

    #[test]
    fn overflow_saturates_to_max_finite() {
        // Maximum exponent, full mantissa: far beyond IEEE single range.
        let big = to_f32(0x7FFF_FFFF);
        assert_eq!(big, f32::MAX);
        assert!(big.is_finite());
        let small = to_f32(0xFFFF_FFFF);
        assert_eq!(small, f32::MIN);
        assert!(small.is_finite());
    }

    #[test]
    fn underflow_flushes_to_zero() {
        // Minimum exponent (16^-64), top mantissa bit only.
        assert_eq!(to_f32(0x0080_0000), 0.0);
        assert_eq!(to_f32(0x0010_0000), 0.0);
    }

    #[test]
    fn roundtrip_at_ibm_representation() {
        // Normalized IBM patterns survive ibm -> ieee -> ibm unchanged.
        for pattern in [
            0x4110_0000u32,
            0xC276_A000,
            0x4080_0000,
            0x4264_4000, // 100.25
            0xC210_0000,
            0x3E10_0000,
        ] {
            assert_eq!(from_ieee_bits(to_ieee_bits(pattern)), pattern);
        }
    }

    #[test]
    fn roundtrip_of_exactly_representable_floats() {
        for value in [1.0f32, -2.5, 0.0, 100.25, 0.15625, -0.125, 42.0, 32768.0] {
            assert_eq!(to_f32(from_f32(value)), value);
        }
    }

    #[test]
    fn lossy_values_stabilize_after_one_pass() {
        // Arbitrary IEEE values may lose low mantissa bits on the way in,
        // but the IBM image itself is a fixed point of the round trip.
        for value in [0.1f32, std::f32::consts::PI, -1.0e-20, 3.0e30] {
            let once = to_f32(from_f32(value));
            assert_eq!(from_f32(once), from_f32(value));
            assert_eq!(to_f32(from_f32(once)), once);
        }
    }
}
