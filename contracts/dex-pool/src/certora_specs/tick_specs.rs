// ============================================================================
// TICK AND POOL PARAMETER SPECIFICATIONS
// ============================================================================
//
// KEY INVARIANTS:
// 1. check_ticks accepts exactly the valid, spaced ranges
// 2. The tick bitmap position is a bijection on compressed ticks
// 3. Protocol fee denominators are 0 or 4..=10
// 4. A swap step never spends more than the remaining amount
//
// ============================================================================

use crate::invariants::{
    fee_protocol_valid, liquidity_delta_valid, swap_step_toward_target,
    swap_step_within_remaining, tick_on_spacing, tick_range_valid,
};
use crate::liquidity::check_ticks;
use crate::tick_bitmap::position;
use cvlr::asserts::{cvlr_assert, cvlr_assume};
use cvlr_soroban_derive::rule;
use dex_math::{add_delta, compute_swap_step, get_sqrt_ratio_at_tick};
use dex_types::{FEE_DENOMINATOR, MAX_TICK_SPACING};

/// RULE: check_ticks agrees with the range and spacing predicates
#[rule]
pub fn check_ticks_matches_invariants(tick_lower: i32, tick_upper: i32, tick_spacing: i32) {
    cvlr_assume!(tick_spacing > 0 && tick_spacing < MAX_TICK_SPACING);

    let valid = tick_range_valid(tick_lower, tick_upper)
        && tick_on_spacing(tick_lower, tick_spacing)
        && tick_on_spacing(tick_upper, tick_spacing);
    cvlr_assert!(check_ticks(tick_lower, tick_upper, tick_spacing).is_ok() == valid);
}

/// RULE: Word and bit recombine into the compressed tick
#[rule]
pub fn bitmap_position_roundtrip(compressed: i32) {
    let (word_pos, bit_pos) = position(compressed);
    cvlr_assert!(word_pos * 256 + bit_pos as i32 == compressed);
}

/// RULE: add_delta succeeds exactly when the delta is valid
#[rule]
pub fn add_delta_matches_invariant(liquidity: u128, delta: i128) {
    cvlr_assert!(add_delta(liquidity, delta).is_ok() == liquidity_delta_valid(liquidity, delta));
}

/// RULE: Packed protocol fees decode to the values set
#[rule]
pub fn fee_protocol_packing(fee_protocol0: u32, fee_protocol1: u32) {
    cvlr_assume!(fee_protocol_valid(fee_protocol0) && fee_protocol_valid(fee_protocol1));

    let packed = fee_protocol0 + (fee_protocol1 << 4);
    cvlr_assert!(packed % 16 == fee_protocol0);
    cvlr_assert!(packed >> 4 == fee_protocol1);
}

/// RULE: A swap step stays within the remaining amount and moves toward the target
#[rule]
pub fn swap_step_bounded(
    tick_current: i32,
    tick_target: i32,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) {
    cvlr_assume!(fee_pips < FEE_DENOMINATOR);
    cvlr_assume!(amount_remaining != i128::MIN);

    let (current, target) = match (
        get_sqrt_ratio_at_tick(tick_current),
        get_sqrt_ratio_at_tick(tick_target),
    ) {
        (Ok(current), Ok(target)) => (current, target),
        _ => return,
    };

    if let Ok(step) = compute_swap_step(current, target, liquidity, amount_remaining, fee_pips) {
        cvlr_assert!(swap_step_within_remaining(&step, amount_remaining));
        cvlr_assert!(swap_step_toward_target(current, target, &step));
    }
}
