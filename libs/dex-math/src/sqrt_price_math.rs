use crate::full_math::{div_rounding_up, mul_div, mul_div_rounding_up};
use dex_types::{to_i128, Error, Q96};
use primitive_types::U256;

/// Largest value representable by a Q64.96 sqrt price
fn max_u160() -> U256 {
    (U256::one() << 160) - 1
}

fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Calculate amount0 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_x = L * (sqrt_pb - sqrt_pa) / (sqrt_pa * sqrt_pb)
pub fn get_amount0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_lower.is_zero() {
        return Err(Error::SqrtPriceOutOfRange);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_ratio_upper - sqrt_ratio_lower;

    if round_up {
        div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_upper)?,
            sqrt_ratio_lower,
        )
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_upper)? / sqrt_ratio_lower)
    }
}

/// Calculate amount1 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_y = L * (sqrt_pb - sqrt_pa)
pub fn get_amount1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let diff = sqrt_ratio_upper - sqrt_ratio_lower;

    if round_up {
        mul_div_rounding_up(U256::from(liquidity), diff, U256::from(Q96))
    } else {
        mul_div(U256::from(liquidity), diff, U256::from(Q96))
    }
}

/// Signed amount0 for a liquidity change: positive (rounded up) when the pool
/// receives tokens, negative (rounded down) when it pays them out
pub fn get_amount0_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity_delta: i128,
) -> Result<i128, Error> {
    let liquidity = liquidity_delta.unsigned_abs();
    if liquidity_delta < 0 {
        let amount = get_amount0_delta(sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, false)?;
        Ok(-to_i128(amount)?)
    } else {
        to_i128(get_amount0_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity,
            true,
        )?)
    }
}

/// Signed amount1 for a liquidity change, rounding as for amount0
pub fn get_amount1_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity_delta: i128,
) -> Result<i128, Error> {
    let liquidity = liquidity_delta.unsigned_abs();
    if liquidity_delta < 0 {
        let amount = get_amount1_delta(sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, false)?;
        Ok(-to_i128(amount)?)
    } else {
        to_i128(get_amount1_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity,
            true,
        )?)
    }
}

/// Get next sqrt price from an input amount of token0 or token1
///
/// Rounds so the price never moves past what the input pays for.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Get next sqrt price from an output amount
///
/// Rounds so the price always moves at least as far as the output requires.
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

fn check_inputs(sqrt_price_x96: U256, liquidity: u128) -> Result<(), Error> {
    if sqrt_price_x96.is_zero() {
        return Err(Error::SqrtPriceOutOfRange);
    }
    if liquidity == 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(())
}

/// Calculate next sqrt price given a token0 amount
/// sqrt_price_next = sqrt_price * L / (L + amount * sqrt_price)  [if add]
/// sqrt_price_next = sqrt_price * L / (L - amount * sqrt_price)  [if remove]
fn get_next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let product = amount.checked_mul(sqrt_price_x96);

    if add {
        if let Some(denominator) = product.and_then(|p| numerator1.checked_add(p)) {
            return mul_div_rounding_up(numerator1, sqrt_price_x96, denominator);
        }
        // L / (L / sqrt_price + amount), less precise but cannot overflow
        let denominator = (numerator1 / sqrt_price_x96)
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        div_rounding_up(numerator1, denominator)
    } else {
        match product {
            Some(product) if numerator1 > product => {
                let result = mul_div_rounding_up(numerator1, sqrt_price_x96, numerator1 - product)?;
                if result > max_u160() {
                    return Err(Error::SqrtPriceOutOfRange);
                }
                Ok(result)
            }
            _ => Err(Error::SqrtPriceOutOfRange),
        }
    }
}

/// Calculate next sqrt price given a token1 amount
/// sqrt_price_next = sqrt_price + amount / L  [if add]
/// sqrt_price_next = sqrt_price - amount / L  [if remove]
fn get_next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    let liquidity = U256::from(liquidity);

    if add {
        let quotient = if amount <= max_u160() {
            (amount << 96) / liquidity
        } else {
            mul_div(amount, U256::from(Q96), liquidity)?
        };
        let next = sqrt_price_x96
            .checked_add(quotient)
            .ok_or(Error::MathOverflow)?;
        if next > max_u160() {
            return Err(Error::SqrtPriceOutOfRange);
        }
        Ok(next)
    } else {
        let quotient = if amount <= max_u160() {
            div_rounding_up(amount << 96, liquidity)?
        } else {
            mul_div_rounding_up(amount, U256::from(Q96), liquidity)?
        };
        if sqrt_price_x96 <= quotient {
            return Err(Error::SqrtPriceOutOfRange);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}
