use crate::callback::{balance, mint_callback, pay};
use crate::lock::PoolLock;
use crate::oracle;
use crate::position;
use crate::storage::{get_config, get_position, get_state, set_position, set_state};
use crate::tick::{self, get_fee_growth_inside, TickSnapshot};
use crate::tick_bitmap::flip_tick;
use dex_math::{add_delta, get_amount0_delta_signed, get_amount1_delta_signed, get_sqrt_ratio_at_tick};
use dex_types::{Error, PoolConfig, PoolState, PositionInfo, PositionKey, ToWide, MAX_TICK, MIN_TICK};
use soroban_sdk::{Address, Bytes, Env, Symbol};

/// Validate a position's tick range
pub fn check_ticks(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> Result<(), Error> {
    if tick_lower >= tick_upper {
        return Err(Error::InvalidTickRange);
    }
    if tick_lower < MIN_TICK || tick_upper > MAX_TICK {
        return Err(Error::TickOutOfRange);
    }
    if tick_lower % tick_spacing != 0 || tick_upper % tick_spacing != 0 {
        return Err(Error::TickNotSpaced);
    }
    Ok(())
}

/// Apply a liquidity delta to a position and the ticks bounding it
///
/// Updates `state` in memory (oracle slot, active liquidity); the caller
/// persists it. Returns the position and the signed token amounts owed to
/// (positive) or by (negative) the pool.
pub fn modify_position(
    env: &Env,
    config: &PoolConfig,
    state: &mut PoolState,
    key: &PositionKey,
    liquidity_delta: i128,
) -> Result<(PositionInfo, i128, i128), Error> {
    check_ticks(key.tick_lower, key.tick_upper, config.tick_spacing)?;

    let position = update_position(env, config, state, key, liquidity_delta)?;

    let mut amount0 = 0i128;
    let mut amount1 = 0i128;

    if liquidity_delta != 0 {
        let sqrt_ratio_lower = get_sqrt_ratio_at_tick(key.tick_lower)?;
        let sqrt_ratio_upper = get_sqrt_ratio_at_tick(key.tick_upper)?;

        if state.tick < key.tick_lower {
            // range is above the price, only token0 is involved
            amount0 = get_amount0_delta_signed(sqrt_ratio_lower, sqrt_ratio_upper, liquidity_delta)?;
        } else if state.tick < key.tick_upper {
            // in range: record the oracle before active liquidity changes
            let (index, cardinality) = oracle::write(
                env,
                state.observation_index,
                env.ledger().timestamp(),
                state.tick,
                state.liquidity,
                state.observation_cardinality,
                state.observation_cardinality_next,
            );
            state.observation_index = index;
            state.observation_cardinality = cardinality;

            let sqrt_price = state.sqrt_price_x96.to_wide();
            amount0 = get_amount0_delta_signed(sqrt_price, sqrt_ratio_upper, liquidity_delta)?;
            amount1 = get_amount1_delta_signed(sqrt_ratio_lower, sqrt_price, liquidity_delta)?;

            state.liquidity = add_delta(state.liquidity, liquidity_delta)?;
        } else {
            // range is below the price, only token1 is involved
            amount1 = get_amount1_delta_signed(sqrt_ratio_lower, sqrt_ratio_upper, liquidity_delta)?;
        }
    }

    Ok((position, amount0, amount1))
}

fn update_position(
    env: &Env,
    config: &PoolConfig,
    state: &PoolState,
    key: &PositionKey,
    liquidity_delta: i128,
) -> Result<PositionInfo, Error> {
    let fee_growth_global_0 = state.fee_growth_global_0_x128.to_wide();
    let fee_growth_global_1 = state.fee_growth_global_1_x128.to_wide();

    let mut flipped_lower = false;
    let mut flipped_upper = false;

    if liquidity_delta != 0 {
        let time = env.ledger().timestamp();
        let (tick_cumulative, spl_cumulative_x128) = oracle::observe_single(
            env,
            time,
            0,
            state.tick,
            state.observation_index,
            state.liquidity,
            state.observation_cardinality,
        )?;
        let snapshot = TickSnapshot {
            fee_growth_global_0_x128: fee_growth_global_0,
            fee_growth_global_1_x128: fee_growth_global_1,
            spl_cumulative_x128,
            tick_cumulative,
            time,
        };

        flipped_lower = tick::update(
            env,
            key.tick_lower,
            state.tick,
            liquidity_delta,
            &snapshot,
            false,
            config.max_liquidity_per_tick,
        )?;
        flipped_upper = tick::update(
            env,
            key.tick_upper,
            state.tick,
            liquidity_delta,
            &snapshot,
            true,
            config.max_liquidity_per_tick,
        )?;

        if flipped_lower {
            flip_tick(env, key.tick_lower, config.tick_spacing)?;
        }
        if flipped_upper {
            flip_tick(env, key.tick_upper, config.tick_spacing)?;
        }
    }

    let (fee_growth_inside_0, fee_growth_inside_1) = get_fee_growth_inside(
        env,
        key.tick_lower,
        key.tick_upper,
        state.tick,
        fee_growth_global_0,
        fee_growth_global_1,
    );

    let position = position::update(
        env,
        key,
        liquidity_delta,
        fee_growth_inside_0,
        fee_growth_inside_1,
    )?;

    // ticks that lost their last reference are no longer needed
    if liquidity_delta < 0 {
        if flipped_lower {
            tick::clear(env, key.tick_lower);
        }
        if flipped_upper {
            tick::clear(env, key.tick_upper);
        }
    }

    Ok(position)
}

/// Mint (add) liquidity to a position owned by `recipient`
///
/// `sender` is called back with the amounts owed and must have paid them
/// by the time the callback returns.
pub fn mint(
    env: &Env,
    sender: Address,
    recipient: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount: u128,
    data: Bytes,
) -> Result<(i128, i128), Error> {
    let _lock = PoolLock::acquire(env)?;

    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    let liquidity_delta = i128::try_from(amount).map_err(|_| Error::LiquidityOverflow)?;

    let config = get_config(env)?;
    let mut state = get_state(env)?;

    let key = PositionKey {
        owner: recipient.clone(),
        tick_lower,
        tick_upper,
    };
    let (_, amount0, amount1) =
        modify_position(env, &config, &mut state, &key, liquidity_delta)?;
    set_state(env, &state);

    let balance0_before = if amount0 > 0 { balance(env, &config.token0) } else { 0 };
    let balance1_before = if amount1 > 0 { balance(env, &config.token1) } else { 0 };

    mint_callback(env, &sender, amount0, amount1, &data);

    if amount0 > 0 && owed_more_than_paid(balance0_before, amount0, balance(env, &config.token0))? {
        return Err(Error::InsufficientInputAmount);
    }
    if amount1 > 0 && owed_more_than_paid(balance1_before, amount1, balance(env, &config.token1))? {
        return Err(Error::InsufficientInputAmount);
    }

    env.events().publish(
        (Symbol::new(env, "mint"),),
        (sender, recipient, tick_lower, tick_upper, amount, amount0, amount1),
    );

    Ok((amount0, amount1))
}

/// Whether the balance grew by less than `owed`
pub fn owed_more_than_paid(before: i128, owed: i128, after: i128) -> Result<bool, Error> {
    let required = before.checked_add(owed).ok_or(Error::MathOverflow)?;
    Ok(required > after)
}

/// Burn (remove) liquidity and credit the tokens to the position
///
/// A zero amount settles accrued fees without removing anything.
pub fn burn(
    env: &Env,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount: u128,
) -> Result<(i128, i128), Error> {
    let _lock = PoolLock::acquire(env)?;

    let liquidity_delta = i128::try_from(amount)
        .map_err(|_| Error::LiquidityOverflow)?
        .checked_neg()
        .ok_or(Error::LiquidityOverflow)?;

    let config = get_config(env)?;
    let mut state = get_state(env)?;

    let key = PositionKey {
        owner: owner.clone(),
        tick_lower,
        tick_upper,
    };
    let (mut position, amount0, amount1) =
        modify_position(env, &config, &mut state, &key, liquidity_delta)?;

    let amount0 = -amount0;
    let amount1 = -amount1;

    if amount0 > 0 || amount1 > 0 {
        position.tokens_owed_0 = position.tokens_owed_0.wrapping_add(amount0 as u128);
        position.tokens_owed_1 = position.tokens_owed_1.wrapping_add(amount1 as u128);
        set_position(env, &key, &position);
    }

    set_state(env, &state);

    env.events().publish(
        (Symbol::new(env, "burn"),),
        (owner, tick_lower, tick_upper, amount, amount0, amount1),
    );

    Ok((amount0, amount1))
}

/// Collect owed tokens from a position, up to the requested amounts
pub fn collect(
    env: &Env,
    owner: Address,
    recipient: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount0_requested: u128,
    amount1_requested: u128,
) -> Result<(u128, u128), Error> {
    let _lock = PoolLock::acquire(env)?;

    let config = get_config(env)?;

    let key = PositionKey {
        owner: owner.clone(),
        tick_lower,
        tick_upper,
    };
    let mut position = get_position(env, &key);

    let amount0 = amount0_requested.min(position.tokens_owed_0);
    let amount1 = amount1_requested.min(position.tokens_owed_1);

    if amount0 > 0 || amount1 > 0 {
        position.tokens_owed_0 -= amount0;
        position.tokens_owed_1 -= amount1;
        set_position(env, &key, &position);

        pay(env, &config.token0, &recipient, amount0)?;
        pay(env, &config.token1, &recipient, amount1)?;
    }

    env.events().publish(
        (Symbol::new(env, "collect"),),
        (owner, recipient, tick_lower, tick_upper, amount0, amount1),
    );

    Ok((amount0, amount1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_ticks() {
        assert_eq!(check_ticks(-60, 60, 60), Ok(()));
        assert_eq!(check_ticks(60, 60, 60), Err(Error::InvalidTickRange));
        assert_eq!(check_ticks(60, -60, 60), Err(Error::InvalidTickRange));
        assert_eq!(check_ticks(MIN_TICK - 1, 0, 1), Err(Error::TickOutOfRange));
        assert_eq!(check_ticks(0, MAX_TICK + 1, 1), Err(Error::TickOutOfRange));
        assert_eq!(check_ticks(-61, 60, 60), Err(Error::TickNotSpaced));
        assert_eq!(check_ticks(-60, 59, 60), Err(Error::TickNotSpaced));
    }

    #[test]
    fn test_owed_more_than_paid() {
        assert_eq!(owed_more_than_paid(100, 10, 110), Ok(false));
        assert_eq!(owed_more_than_paid(100, 10, 111), Ok(false));
        assert_eq!(owed_more_than_paid(100, 10, 109), Ok(true));
        assert_eq!(owed_more_than_paid(i128::MAX, 1, 0), Err(Error::MathOverflow));
    }
}
