// ============================================================================
// MATH INVARIANT SPECIFICATIONS
// ============================================================================
//
// KEY INVARIANTS:
// 1. Tick-to-price conversion is monotonic and stays inside the price bounds
// 2. Price-to-tick returns the greatest tick at or below the price
// 3. mul_div and mul_div_rounding_up differ by at most one
// 4. add_delta moves liquidity in the direction of the delta
//
// ============================================================================

use cvlr::asserts::{cvlr_assert, cvlr_assume, cvlr_satisfy};
use cvlr_soroban_derive::rule;
use dex_math::{
    add_delta, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, mul_div, mul_div_rounding_up,
};
use dex_types::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use primitive_types::U256;

/// RULE: Sanity check - sqrt ratio calculation is reachable
#[rule]
pub fn sanity_sqrt_ratio(tick: i32) {
    cvlr_assume!(tick >= MIN_TICK && tick <= MAX_TICK);
    let ratio = get_sqrt_ratio_at_tick(tick);
    cvlr_satisfy!(ratio.is_ok());
}

/// RULE: Sqrt ratio is strictly increasing with tick
#[rule]
pub fn sqrt_ratio_monotonic(tick1: i32, tick2: i32) {
    cvlr_assume!(tick1 >= MIN_TICK && tick2 <= MAX_TICK);
    cvlr_assume!(tick1 < tick2);

    match (get_sqrt_ratio_at_tick(tick1), get_sqrt_ratio_at_tick(tick2)) {
        (Ok(ratio1), Ok(ratio2)) => cvlr_assert!(ratio1 < ratio2),
        _ => cvlr_assert!(false),
    }
}

/// RULE: Every valid tick maps into [MIN_SQRT_RATIO, MAX_SQRT_RATIO]
#[rule]
pub fn sqrt_ratio_in_bounds(tick: i32) {
    cvlr_assume!(tick >= MIN_TICK && tick <= MAX_TICK);
    match get_sqrt_ratio_at_tick(tick) {
        Ok(ratio) => cvlr_assert!(ratio >= MIN_SQRT_RATIO && ratio <= MAX_SQRT_RATIO),
        Err(_) => cvlr_assert!(false),
    }
}

/// RULE: Ticks outside the range are rejected
#[rule]
pub fn sqrt_ratio_rejects_out_of_range(tick: i32) {
    cvlr_assume!(tick < MIN_TICK || tick > MAX_TICK);
    cvlr_assert!(get_sqrt_ratio_at_tick(tick).is_err());
}

/// RULE: Tick roundtrip is exact
#[rule]
pub fn tick_roundtrip_exact(tick: i32) {
    cvlr_assume!(tick >= MIN_TICK && tick < MAX_TICK);

    let recovered = get_sqrt_ratio_at_tick(tick).and_then(get_tick_at_sqrt_ratio);
    cvlr_assert!(recovered == Ok(tick));
}

/// RULE: mul_div rounds down, mul_div_rounding_up at most one above it
#[rule]
pub fn mul_div_rounding_gap(a: u128, b: u128, c: u128) {
    cvlr_assume!(c > 0);

    let (a, b, c) = (U256::from(a), U256::from(b), U256::from(c));
    match (mul_div(a, b, c), mul_div_rounding_up(a, b, c)) {
        (Ok(down), Ok(up)) => {
            cvlr_assert!(down <= up);
            cvlr_assert!(up - down <= U256::one());
        }
        _ => cvlr_assert!(false),
    }
}

/// RULE: add_delta with positive delta increases value
#[rule]
pub fn add_delta_positive_increases(liquidity: u128, delta: i128) {
    cvlr_assume!(delta > 0);
    cvlr_assume!(liquidity < u128::MAX - (delta as u128));

    match add_delta(liquidity, delta) {
        Ok(result) => cvlr_assert!(result > liquidity),
        Err(_) => cvlr_assert!(false),
    }
}

/// RULE: add_delta with negative delta decreases value or fails
#[rule]
pub fn add_delta_negative_decreases(liquidity: u128, delta: i128) {
    cvlr_assume!(delta < 0);

    match add_delta(liquidity, delta) {
        Ok(result) => cvlr_assert!(result < liquidity),
        Err(_) => cvlr_assert!(liquidity < delta.unsigned_abs()),
    }
}
