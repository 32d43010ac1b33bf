//! IBM System/370 single-precision hexadecimal floating point.
//!
//! Word layout: sign bit 31, excess-64 base-16 exponent in bits 30-24,
//! 24-bit fraction in bits 23-0 with the radix point before the first
//! hex digit. Used by SEG-Y sample format code 1.

/// Decode an IBM float word into an `f64`.
///
/// `(1 - 2*sign) * (fraction / 2^24) * 16^(exponent - 64)`. Every IBM
/// value is exactly representable in `f64`.
pub fn ibm_to_f64(word: u32) -> f64 {
    let sign = (word >> 31) & 0x01;
    let exponent = ((word >> 24) & 0x7F) as i32;
    let fraction = f64::from(word & 0x00FF_FFFF) / f64::from(1u32 << 24);

    let magnitude = fraction * 2f64.powi(4 * (exponent - 64));
    if sign == 1 { -magnitude } else { magnitude }
}

/// Decode an IBM float word into an `f32` (rounded to nearest).
///
/// IBM has the wider exponent range: magnitudes above `f32::MAX` become
/// infinities, tiny magnitudes become subnormals or zero.
pub fn ibm_to_f32(word: u32) -> f32 {
    ibm_to_f64(word) as f32
}

/// Encode an `f32` as an IBM float word.
///
/// Precision lost in the conversion is truncated toward zero. Infinities
/// and NaNs map to the largest representable IBM magnitude with the
/// input's sign.
pub fn f32_to_ibm(value: f32) -> u32 {
    let bits = value.to_bits();
    let sign = bits >> 31;
    let mut fraction = bits << 1;
    let mut exponent = (fraction >> 24) as i32;
    fraction <<= 8;

    if exponent == 255 {
        return 0x7FFF_FFFF | (sign << 31);
    } else if exponent > 0 {
        // restore the implicit leading bit
        fraction = (fraction >> 1) | 0x8000_0000;
    } else if fraction == 0 {
        return sign << 31;
    }

    // base 2 excess 127, point after the first digit
    // -> base 16 excess 64, point before the first digit
    exponent += 130;
    fraction >>= (-exponent) & 3;
    exponent = (exponent + 3) >> 2;

    // subnormal inputs need renormalising
    while fraction < 0x1000_0000 {
        exponent -= 1;
        fraction <<= 4;
    }

    (fraction >> 8) | ((exponent as u32) << 24) | (sign << 31)
}
