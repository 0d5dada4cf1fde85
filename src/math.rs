/// Shared allocation arithmetic
///
/// Every conversion in the engine is a multiply-then-divide that must floor
/// (truncate toward zero) and must never wrap silently: the multiply is
/// evaluated in 512-bit intermediate precision and the result is rejected
/// with [`Error::Overflow`] if it does not fit back into a `U256`.
use crate::error::Error;
use alloy_primitives::aliases::U512;
use alloy_primitives::U256;

/// Floor of `a * b / denominator`, computed in 512-bit intermediate precision.
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Result<U256, Error> {
    if denominator.is_zero() {
        return Err(Error::InvalidInput("division by zero".to_string()));
    }
    let product = widen(a)
        .checked_mul(widen(b))
        .ok_or(Error::Overflow)?;
    narrow(product / widen(denominator))
}

/// Floor of `amount * percent / 100`. `percent` is validated to be at most
/// 100 by the configuration layer, so the result never exceeds `amount`.
pub fn percent_of(amount: U256, percent: u8) -> Result<U256, Error> {
    mul_div_floor(amount, U256::from(percent), U256::from(100u8))
}

/// `10^decimals` as a `U256`; aborts on overflow rather than wrapping.
pub fn pow10(decimals: u8) -> Result<U256, Error> {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or(Error::Overflow)
}

fn widen(x: U256) -> U512 {
    U512::from_be_slice(&x.to_be_bytes::<32>())
}

fn narrow(x: U512) -> Result<U256, Error> {
    let bytes = x.to_be_bytes::<64>();
    if bytes[..32].iter().any(|b| *b != 0) {
        return Err(Error::Overflow);
    }
    Ok(U256::from_be_slice(&bytes[32..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floors_toward_zero() {
        let r = mul_div_floor(U256::from(7u8), U256::from(3u8), U256::from(2u8)).unwrap();
        assert_eq!(r, U256::from(10u8)); // 21 / 2 = 10.5 -> 10
    }

    #[test]
    fn mul_div_survives_wide_intermediates() {
        // a * b overflows 256 bits before the divide brings it back in range
        let a = U256::MAX;
        let r = mul_div_floor(a, U256::from(4u8), U256::from(8u8)).unwrap();
        assert_eq!(r, a / U256::from(2u8));
    }

    #[test]
    fn mul_div_rejects_oversized_results() {
        let err = mul_div_floor(U256::MAX, U256::from(2u8), U256::from(1u8)).unwrap_err();
        assert_eq!(err, Error::Overflow);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        let err = mul_div_floor(U256::from(1u8), U256::from(1u8), U256::ZERO).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn percent_of_floors() {
        assert_eq!(
            percent_of(U256::from(100u8), 2).unwrap(),
            U256::from(2u8)
        );
        assert_eq!(
            percent_of(U256::from(99u8), 2).unwrap(),
            U256::from(1u8) // 1.98 -> 1
        );
        assert_eq!(percent_of(U256::from(50u8), 100).unwrap(), U256::from(50u8));
    }

    #[test]
    fn pow10_matches_decimals() {
        assert_eq!(pow10(0).unwrap(), U256::from(1u8));
        assert_eq!(pow10(6).unwrap(), U256::from(1_000_000u32));
        assert_eq!(pow10(18).unwrap(), U256::from(10u8).pow(U256::from(18u8)));
    }
}
