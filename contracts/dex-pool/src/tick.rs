use crate::storage::{get_tick, remove_tick, set_tick};
use dex_math::{add_delta, wrapping_sub};
use dex_types::{Error, ToHost, ToWide};
use primitive_types::U256;
use soroban_sdk::Env;

/// Global accumulators at the moment a tick is touched
#[derive(Clone, Copy, Debug)]
pub struct TickSnapshot {
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub spl_cumulative_x128: U256,
    pub tick_cumulative: i64,
    pub time: u64,
}

/// Update a tick with liquidity delta
/// Returns true if the tick was flipped (initialized or uninitialized)
pub fn update(
    env: &Env,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    snapshot: &TickSnapshot,
    upper: bool,
    max_liquidity: u128,
) -> Result<bool, Error> {
    let mut info = get_tick(env, tick);

    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = add_delta(liquidity_gross_before, liquidity_delta)?;

    if liquidity_gross_after > max_liquidity {
        return Err(Error::LiquidityOverflow);
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

    if liquidity_gross_before == 0 {
        // By convention all growth before initialization happened below the tick
        if tick <= tick_current {
            info.fee_growth_outside_0_x128 = snapshot.fee_growth_global_0_x128.to_host(env);
            info.fee_growth_outside_1_x128 = snapshot.fee_growth_global_1_x128.to_host(env);
            info.spl_outside_x128 = snapshot.spl_cumulative_x128.to_host(env);
            info.tick_cumulative_outside = snapshot.tick_cumulative;
            info.seconds_outside = snapshot.time;
        }
        info.initialized = true;
    }

    info.liquidity_gross = liquidity_gross_after;

    // Lower tick adds to liquidity_net, upper tick subtracts
    info.liquidity_net = if upper {
        info.liquidity_net.checked_sub(liquidity_delta)
    } else {
        info.liquidity_net.checked_add(liquidity_delta)
    }
    .ok_or(Error::LiquidityOverflow)?;

    set_tick(env, tick, &info);

    Ok(flipped)
}

/// Drop a tick that no longer has any liquidity referencing it
pub fn clear(env: &Env, tick: i32) {
    remove_tick(env, tick);
}

/// Cross a tick during a swap
/// Returns the liquidity_net to apply when moving left to right
pub fn cross(env: &Env, tick: i32, snapshot: &TickSnapshot) -> i128 {
    let mut info = get_tick(env, tick);

    info.fee_growth_outside_0_x128 = wrapping_sub(
        snapshot.fee_growth_global_0_x128,
        info.fee_growth_outside_0_x128.to_wide(),
    )
    .to_host(env);
    info.fee_growth_outside_1_x128 = wrapping_sub(
        snapshot.fee_growth_global_1_x128,
        info.fee_growth_outside_1_x128.to_wide(),
    )
    .to_host(env);
    info.spl_outside_x128 = wrapping_sub(
        snapshot.spl_cumulative_x128,
        info.spl_outside_x128.to_wide(),
    )
    .to_host(env);
    info.tick_cumulative_outside = snapshot
        .tick_cumulative
        .wrapping_sub(info.tick_cumulative_outside);
    info.seconds_outside = snapshot.time.wrapping_sub(info.seconds_outside);

    set_tick(env, tick, &info);

    info.liquidity_net
}

/// Get fee growth inside a tick range
pub fn get_fee_growth_inside(
    env: &Env,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let lower = get_tick(env, tick_lower);
    let upper = get_tick(env, tick_upper);

    let lower_0 = lower.fee_growth_outside_0_x128.to_wide();
    let lower_1 = lower.fee_growth_outside_1_x128.to_wide();
    let upper_0 = upper.fee_growth_outside_0_x128.to_wide();
    let upper_1 = upper.fee_growth_outside_1_x128.to_wide();

    let (fee_growth_below_0, fee_growth_below_1) = if tick_current >= tick_lower {
        (lower_0, lower_1)
    } else {
        (
            wrapping_sub(fee_growth_global_0_x128, lower_0),
            wrapping_sub(fee_growth_global_1_x128, lower_1),
        )
    };

    let (fee_growth_above_0, fee_growth_above_1) = if tick_current < tick_upper {
        (upper_0, upper_1)
    } else {
        (
            wrapping_sub(fee_growth_global_0_x128, upper_0),
            wrapping_sub(fee_growth_global_1_x128, upper_1),
        )
    };

    (
        wrapping_sub(
            wrapping_sub(fee_growth_global_0_x128, fee_growth_below_0),
            fee_growth_above_0,
        ),
        wrapping_sub(
            wrapping_sub(fee_growth_global_1_x128, fee_growth_below_1),
            fee_growth_above_1,
        ),
    )
}
