// ============================================================================
// POOL INVARIANTS
// ============================================================================
//
// Pure predicates over pool values. The contract uses some of them for
// validation; the unit tests and the formal verification rules check the
// rest against real pool state.
//
// GROUPS:
//
// 1. PRICE      - sqrt price and tick stay in range and agree with each other
// 2. LIQUIDITY  - deltas never underflow, tick liquidity stays under the cap
// 3. TICKS      - position ranges are ordered and on the spacing grid
// 4. FEES       - protocol fee denominators are 0 or 4..=10
// 5. SWAP STEPS - a step never consumes or produces more than remains
//
// ============================================================================

use dex_math::{get_sqrt_ratio_at_tick, SwapStepResult};
use dex_types::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use primitive_types::U256;

// ============================================================================
// PRICE INVARIANTS
// ============================================================================

/// Property:
///   MIN_SQRT_RATIO <= sqrt_price_x96 < MAX_SQRT_RATIO
pub fn price_in_bounds(sqrt_price_x96: U256) -> bool {
    sqrt_price_x96 >= MIN_SQRT_RATIO && sqrt_price_x96 < MAX_SQRT_RATIO
}

/// Property:
///   MIN_TICK <= tick <= MAX_TICK
pub fn tick_in_bounds(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

/// Invariant: the tick brackets the price
///
/// Property:
///   sqrt_ratio(tick) <= sqrt_price_x96 <= sqrt_ratio(tick + 1)
///
/// The upper side is inclusive: a swap moving down that stops exactly on an
/// initialized tick leaves the price at that tick with the current tick one
/// below it.
pub fn tick_consistent_with_price(tick: i32, sqrt_price_x96: U256) -> bool {
    let lower = match get_sqrt_ratio_at_tick(tick) {
        Ok(ratio) => ratio,
        Err(_) => return false,
    };
    let upper = match get_sqrt_ratio_at_tick(tick.saturating_add(1)) {
        Ok(ratio) => ratio,
        Err(_) => return false,
    };
    lower <= sqrt_price_x96 && sqrt_price_x96 <= upper
}

// ============================================================================
// LIQUIDITY INVARIANTS
// ============================================================================

/// Property:
///   tick.liquidity_gross <= max_liquidity_per_tick
pub fn tick_liquidity_bounded(liquidity_gross: u128, max_liquidity_per_tick: u128) -> bool {
    liquidity_gross <= max_liquidity_per_tick
}

/// Invariant: applying a delta neither underflows nor overflows
pub fn liquidity_delta_valid(liquidity: u128, delta: i128) -> bool {
    if delta < 0 {
        liquidity >= delta.unsigned_abs()
    } else {
        liquidity.checked_add(delta as u128).is_some()
    }
}

// ============================================================================
// TICK INVARIANTS
// ============================================================================

/// Property:
///   MIN_TICK <= tick_lower < tick_upper <= MAX_TICK
pub fn tick_range_valid(tick_lower: i32, tick_upper: i32) -> bool {
    tick_lower < tick_upper && tick_lower >= MIN_TICK && tick_upper <= MAX_TICK
}

/// Property:
///   tick % tick_spacing == 0
pub fn tick_on_spacing(tick: i32, tick_spacing: i32) -> bool {
    tick_spacing > 0 && tick % tick_spacing == 0
}

// ============================================================================
// FEE INVARIANTS
// ============================================================================

/// Property:
///   fee_protocol == 0 || 4 <= fee_protocol <= 10
pub fn fee_protocol_valid(fee_protocol: u32) -> bool {
    fee_protocol == 0 || (4..=10).contains(&fee_protocol)
}

// ============================================================================
// SWAP STEP INVARIANTS
// ============================================================================

/// Invariant: a swap step stays within the remaining amount
///
/// Property (exact input, remaining > 0):
///   amount_in + fee_amount <= remaining
/// Property (exact output, remaining < 0):
///   amount_out <= |remaining|
pub fn swap_step_within_remaining(step: &SwapStepResult, amount_remaining: i128) -> bool {
    let remaining = amount_remaining.unsigned_abs();
    if amount_remaining >= 0 {
        match step.amount_in.checked_add(step.fee_amount) {
            Some(consumed) => consumed <= remaining,
            None => false,
        }
    } else {
        step.amount_out <= remaining
    }
}

/// Invariant: the step moved the price toward the target without passing it
pub fn swap_step_toward_target(current: U256, target: U256, step: &SwapStepResult) -> bool {
    let next = step.sqrt_ratio_next_x96;
    if target <= current {
        next <= current && next >= target
    } else {
        next >= current && next <= target
    }
}

// ============================================================================
// TESTS
// ============================================================================
