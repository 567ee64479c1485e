use dex_types::Error;
use primitive_types::{U256, U512};

/// Multiply and divide with 512-bit intermediate precision (rounds down)
/// Returns floor(a * b / denominator)
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, Error> {
    if denominator.is_zero() {
        return Err(Error::DivisionByZero);
    }

    let product = a.full_mul(b);
    let quotient = product / U512::from(denominator);

    U256::try_from(quotient).map_err(|_| Error::MathOverflow)
}

/// Multiply and divide with 512-bit intermediate precision (rounds up)
/// Returns ceil(a * b / denominator)
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, Error> {
    let result = mul_div(a, b, denominator)?;

    let remainder = a.full_mul(b) % U512::from(denominator);
    if remainder.is_zero() {
        Ok(result)
    } else {
        result.checked_add(U256::one()).ok_or(Error::MathOverflow)
    }
}

/// Unsigned division with rounding up
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, Error> {
    if b.is_zero() {
        return Err(Error::DivisionByZero);
    }
    let (quotient, remainder) = a.div_mod(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// Modular addition, used by the Q128 accumulators that are allowed to wrap
pub fn wrapping_add(a: U256, b: U256) -> U256 {
    a.overflowing_add(b).0
}

/// Modular subtraction, used by the Q128 accumulators that are allowed to wrap
pub fn wrapping_sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}
