use crate::CodegenError;

/// Convert a value to a signed 32-bit fixed-point number with `frac_bits` fractional bits.
///
/// Same conversion as a C `(int32_t)(value * (1 << frac_bits))`: the scaled value is truncated
/// toward zero. Returns `None` when the result does not fit in an `i32`, which includes every
/// `frac_bits` of 32 and above.
pub fn to_fixed(value: f32, frac_bits: u32) -> Option<i32> {
    let scale = f64::from(1u32.checked_shl(frac_bits)?);
    let scaled = (f64::from(value) * scale).trunc();

    if !scaled.is_finite() || scaled < f64::from(i32::MIN) || scaled > f64::from(i32::MAX) {
        return None;
    }

    Some(scaled as i32)
}

pub(crate) fn check_frac_bits(frac_bits: u32) -> Result<(), CodegenError> {
    if frac_bits > crate::NumericFormat::MAX_FRAC_BITS {
        return Err(CodegenError::InvalidFracBits(frac_bits));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, 10, Some(512))]
    #[case(-1.75, 10, Some(-1792))]
    #[case(0.0009, 10, Some(0))]
    #[case(-0.0009, 10, Some(0))]
    #[case(1.0, 0, Some(1))]
    #[case(1.0, 30, Some(1 << 30))]
    #[case(-2.0, 30, Some(i32::MIN))]
    #[case(2.0, 30, None)]
    #[case(3.0e6, 10, None)]
    #[case(0.0, 31, Some(0))]
    #[case(1.0, 32, None)]
    #[case(0.0, 32, None)]
    #[case(1.0, u32::MAX, None)]
    fn conversion(#[case] value: f32, #[case] frac_bits: u32, #[case] expected: Option<i32>) {
        assert_eq!(to_fixed(value, frac_bits), expected);
    }

    #[test]
    fn frac_bits_range() {
        assert!(check_frac_bits(30).is_ok());
        assert_eq!(check_frac_bits(31), Err(CodegenError::InvalidFracBits(31)));
    }
}
