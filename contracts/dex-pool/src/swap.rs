use crate::callback::{balance, pay, swap_callback};
use crate::liquidity::owed_more_than_paid;
use crate::lock::PoolLock;
use crate::oracle;
use crate::storage::{get_config, get_state, set_state};
use crate::tick::{cross, TickSnapshot};
use crate::tick_bitmap::next_initialized_tick_within_one_word;
use dex_math::{
    add_delta, compute_swap_step, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, mul_div,
    wrapping_add,
};
use dex_types::{Error, ToHost, ToWide, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use primitive_types::U256;
use soroban_sdk::{Address, Bytes, Env, Symbol};

fn q128() -> U256 {
    U256::one() << 128
}

fn to_signed(amount: u128) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::MathOverflow)
}

/// Whether a price limit lies strictly between the current price and the bound
/// in the swap direction
pub fn price_limit_valid(sqrt_price_x96: U256, sqrt_price_limit_x96: U256, zero_for_one: bool) -> bool {
    if zero_for_one {
        sqrt_price_limit_x96 < sqrt_price_x96 && sqrt_price_limit_x96 > MIN_SQRT_RATIO
    } else {
        sqrt_price_limit_x96 > sqrt_price_x96 && sqrt_price_limit_x96 < MAX_SQRT_RATIO
    }
}

/// Swap against the pool's liquidity
///
/// A positive `amount_specified` is an exact input, a negative one an exact
/// output. The swap stops early when the price reaches `sqrt_price_limit_x96`.
/// Output is paid to `recipient` before `sender` is called back to pay the
/// input.
///
/// Returns the pool's balance deltas: positive amounts were received,
/// negative amounts were paid out.
pub fn swap(
    env: &Env,
    sender: Address,
    recipient: Address,
    zero_for_one: bool,
    amount_specified: i128,
    sqrt_price_limit_x96: U256,
    data: Bytes,
) -> Result<(i128, i128), Error> {
    if amount_specified == 0 {
        return Err(Error::ZeroAmount);
    }

    let _lock = PoolLock::acquire(env)?;

    let config = get_config(env)?;
    let mut state = get_state(env)?;

    if !price_limit_valid(state.sqrt_price_x96.to_wide(), sqrt_price_limit_x96, zero_for_one) {
        return Err(Error::InvalidPriceLimit);
    }

    // values at the start of the swap, used for the oracle
    let tick_start = state.tick;
    let liquidity_start = state.liquidity;
    let time = env.ledger().timestamp();
    let fee_protocol = state.fee_protocol_for(zero_for_one);

    let exact_input = amount_specified > 0;

    let mut amount_remaining = amount_specified;
    let mut amount_calculated: i128 = 0;
    let mut sqrt_price_x96 = state.sqrt_price_x96.to_wide();
    let mut tick = state.tick;
    let mut liquidity = state.liquidity;
    let mut protocol_fee: u128 = 0;
    let mut fee_growth_global_x128 = if zero_for_one {
        state.fee_growth_global_0_x128.to_wide()
    } else {
        state.fee_growth_global_1_x128.to_wide()
    };

    // oracle cumulatives are looked up lazily, on the first initialized crossing
    let mut latest_observation: Option<(i64, U256)> = None;

    while amount_remaining != 0 && sqrt_price_x96 != sqrt_price_limit_x96 {
        let sqrt_price_start = sqrt_price_x96;

        let (tick_next, initialized) =
            next_initialized_tick_within_one_word(env, tick, config.tick_spacing, zero_for_one)?;

        // the bitmap is unaware of the tick bounds
        let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);

        let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(tick_next)?;

        let sqrt_ratio_target_x96 = if zero_for_one {
            sqrt_price_next_x96.max(sqrt_price_limit_x96)
        } else {
            sqrt_price_next_x96.min(sqrt_price_limit_x96)
        };

        let step = compute_swap_step(
            sqrt_price_x96,
            sqrt_ratio_target_x96,
            liquidity,
            amount_remaining,
            config.fee,
        )?;
        sqrt_price_x96 = step.sqrt_ratio_next_x96;

        let amount_in = to_signed(step.amount_in)?;
        let amount_out = to_signed(step.amount_out)?;
        let fee_in = to_signed(step.fee_amount)?;

        if exact_input {
            let consumed = amount_in.checked_add(fee_in).ok_or(Error::MathOverflow)?;
            amount_remaining = amount_remaining.checked_sub(consumed).ok_or(Error::MathOverflow)?;
            amount_calculated = amount_calculated.checked_sub(amount_out).ok_or(Error::MathOverflow)?;
        } else {
            let consumed = amount_in.checked_add(fee_in).ok_or(Error::MathOverflow)?;
            amount_remaining = amount_remaining.checked_add(amount_out).ok_or(Error::MathOverflow)?;
            amount_calculated = amount_calculated.checked_add(consumed).ok_or(Error::MathOverflow)?;
        }

        let mut fee_amount = step.fee_amount;
        if fee_protocol > 0 {
            let delta = fee_amount / fee_protocol as u128;
            fee_amount -= delta;
            protocol_fee = protocol_fee.wrapping_add(delta);
        }

        if liquidity > 0 {
            let growth = mul_div(U256::from(fee_amount), q128(), U256::from(liquidity))?;
            fee_growth_global_x128 = wrapping_add(fee_growth_global_x128, growth);
        }

        if sqrt_price_x96 == sqrt_price_next_x96 {
            if initialized {
                let (tick_cumulative, spl_cumulative_x128) =
                    match latest_observation {
                        Some(observed) => observed,
                        None => {
                            let observed = oracle::observe_single(
                                env,
                                time,
                                0,
                                tick_start,
                                state.observation_index,
                                liquidity_start,
                                state.observation_cardinality,
                            )?;
                            latest_observation = Some(observed);
                            observed
                        }
                    };

                let snapshot = TickSnapshot {
                    fee_growth_global_0_x128: if zero_for_one {
                        fee_growth_global_x128
                    } else {
                        state.fee_growth_global_0_x128.to_wide()
                    },
                    fee_growth_global_1_x128: if zero_for_one {
                        state.fee_growth_global_1_x128.to_wide()
                    } else {
                        fee_growth_global_x128
                    },
                    spl_cumulative_x128,
                    tick_cumulative,
                    time,
                };

                let liquidity_net = cross(env, tick_next, &snapshot);
                // moving left, liquidity_net is interpreted in the opposite direction
                let liquidity_net = if zero_for_one {
                    liquidity_net.checked_neg().ok_or(Error::MathOverflow)?
                } else {
                    liquidity_net
                };
                liquidity = add_delta(liquidity, liquidity_net)?;
            }

            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if sqrt_price_x96 != sqrt_price_start {
            tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        }
    }

    if tick != tick_start {
        let (index, cardinality) = oracle::write(
            env,
            state.observation_index,
            time,
            tick_start,
            liquidity_start,
            state.observation_cardinality,
            state.observation_cardinality_next,
        );
        state.observation_index = index;
        state.observation_cardinality = cardinality;
        state.tick = tick;
    }
    state.sqrt_price_x96 = sqrt_price_x96.to_host(env);
    state.liquidity = liquidity;

    if zero_for_one {
        state.fee_growth_global_0_x128 = fee_growth_global_x128.to_host(env);
        state.protocol_fees_0 = state.protocol_fees_0.wrapping_add(protocol_fee);
    } else {
        state.fee_growth_global_1_x128 = fee_growth_global_x128.to_host(env);
        state.protocol_fees_1 = state.protocol_fees_1.wrapping_add(protocol_fee);
    }

    set_state(env, &state);

    let amount_settled = amount_specified
        .checked_sub(amount_remaining)
        .ok_or(Error::MathOverflow)?;
    let (amount0, amount1) = if zero_for_one == exact_input {
        (amount_settled, amount_calculated)
    } else {
        (amount_calculated, amount_settled)
    };

    if zero_for_one {
        if amount1 < 0 {
            pay(env, &config.token1, &recipient, amount1.unsigned_abs())?;
        }
        let balance0_before = balance(env, &config.token0);
        swap_callback(env, &sender, amount0, amount1, &data);
        if owed_more_than_paid(balance0_before, amount0, balance(env, &config.token0))? {
            return Err(Error::InsufficientInputAmount);
        }
    } else {
        if amount0 < 0 {
            pay(env, &config.token0, &recipient, amount0.unsigned_abs())?;
        }
        let balance1_before = balance(env, &config.token1);
        swap_callback(env, &sender, amount0, amount1, &data);
        if owed_more_than_paid(balance1_before, amount1, balance(env, &config.token1))? {
            return Err(Error::InsufficientInputAmount);
        }
    }

    env.events().publish(
        (Symbol::new(env, "swap"),),
        (
            sender,
            recipient,
            amount0,
            amount1,
            state.sqrt_price_x96,
            state.liquidity,
            state.tick,
        ),
    );

    Ok((amount0, amount1))
}
