use crate::full_math::mul_div;
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use dex_types::{to_u128, Error, Q96};
use primitive_types::U256;

fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Calculate the max liquidity that `amount0` and `amount1` can mint for a
/// price range at the current price
pub fn get_liquidity_for_amounts(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: u128,
    amount1: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= sqrt_ratio_lower {
        // Current price below range - all token0
        get_liquidity_for_amount0(sqrt_ratio_lower, sqrt_ratio_upper, amount0)
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        // Current price in range - both tokens
        let liquidity0 = get_liquidity_for_amount0(sqrt_ratio_x96, sqrt_ratio_upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(sqrt_ratio_lower, sqrt_ratio_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        // Current price above range - all token1
        get_liquidity_for_amount1(sqrt_ratio_lower, sqrt_ratio_upper, amount1)
    }
}

/// L = amount0 * sqrt_pa * sqrt_pb / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let intermediate = mul_div(sqrt_ratio_lower, sqrt_ratio_upper, U256::from(Q96))?;
    to_u128(mul_div(
        U256::from(amount0),
        intermediate,
        sqrt_ratio_upper - sqrt_ratio_lower,
    )?)
}

/// L = amount1 / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount1: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    to_u128(mul_div(
        U256::from(amount1),
        U256::from(Q96),
        sqrt_ratio_upper - sqrt_ratio_lower,
    )?)
}

/// Token amounts held by `liquidity` over a price range at the current price, rounded down
pub fn get_amounts_for_liquidity(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<(u128, u128), Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let (amount0, amount1) = if sqrt_ratio_x96 <= sqrt_ratio_lower {
        (
            get_amount0_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, false)?,
            U256::zero(),
        )
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        (
            get_amount0_delta(sqrt_ratio_x96, sqrt_ratio_upper, liquidity, false)?,
            get_amount1_delta(sqrt_ratio_lower, sqrt_ratio_x96, liquidity, false)?,
        )
    } else {
        (
            U256::zero(),
            get_amount1_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, false)?,
        )
    };

    Ok((to_u128(amount0)?, to_u128(amount1)?))
}

/// Add signed liquidity delta to unsigned liquidity
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, Error> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(Error::LiquidityUnderflow)
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(Error::LiquidityOverflow)
    }
}
