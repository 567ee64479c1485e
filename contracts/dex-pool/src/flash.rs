use crate::callback::{balance, flash_callback, pay};
use crate::lock::PoolLock;
use crate::storage::{get_config, get_state, set_state};
use dex_math::{mul_div, wrapping_add};
use dex_types::{Error, ToHost, ToWide, FEE_DENOMINATOR};
use primitive_types::U256;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{Address, Bytes, Env, Symbol};

/// Flash fee owed on `amount`, rounded up
pub fn flash_fee(amount: u128, fee: u32) -> Result<i128, Error> {
    checked_i128(amount)?
        .fixed_mul_ceil(fee as i128, FEE_DENOMINATOR as i128)
        .ok_or(Error::MathOverflow)
}

/// Split a repaid fee into the protocol share and the share for liquidity providers
pub fn split_paid(paid: u128, fee_protocol: u32) -> (u128, u128) {
    let protocol = if fee_protocol == 0 {
        0
    } else {
        paid / fee_protocol as u128
    };
    (protocol, paid - protocol)
}

fn checked_i128(amount: u128) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::MathOverflow)
}

/// Lend pool tokens to `recipient` for the duration of the callback
///
/// `sender` must return the amounts plus the fees by the time
/// `flash_callback` returns. Whatever was paid on top of the principal is
/// distributed to in-range liquidity, less the protocol share.
pub fn flash(
    env: &Env,
    sender: Address,
    recipient: Address,
    amount0: u128,
    amount1: u128,
    data: Bytes,
) -> Result<(), Error> {
    let _lock = PoolLock::acquire(env)?;

    let config = get_config(env)?;
    let mut state = get_state(env)?;

    let liquidity = state.liquidity;
    if liquidity == 0 {
        return Err(Error::NoLiquidity);
    }

    let fee0 = flash_fee(amount0, config.fee)?;
    let fee1 = flash_fee(amount1, config.fee)?;

    let balance0_before = balance(env, &config.token0);
    let balance1_before = balance(env, &config.token1);

    pay(env, &config.token0, &recipient, amount0)?;
    pay(env, &config.token1, &recipient, amount1)?;

    flash_callback(env, &sender, fee0, fee1, &data);

    let balance0_after = balance(env, &config.token0);
    let balance1_after = balance(env, &config.token1);

    if balance0_before.checked_add(fee0).ok_or(Error::MathOverflow)? > balance0_after {
        return Err(Error::FlashNotRepaid);
    }
    if balance1_before.checked_add(fee1).ok_or(Error::MathOverflow)? > balance1_after {
        return Err(Error::FlashNotRepaid);
    }

    // non-negative after the repayment checks
    let paid0 = (balance0_after - balance0_before) as u128;
    let paid1 = (balance1_after - balance1_before) as u128;

    if paid0 > 0 {
        let (protocol, rest) = split_paid(paid0, state.fee_protocol_for(true));
        state.protocol_fees_0 = state.protocol_fees_0.wrapping_add(protocol);
        let growth = mul_div(U256::from(rest), U256::one() << 128, U256::from(liquidity))?;
        state.fee_growth_global_0_x128 =
            wrapping_add(state.fee_growth_global_0_x128.to_wide(), growth).to_host(env);
    }
    if paid1 > 0 {
        let (protocol, rest) = split_paid(paid1, state.fee_protocol_for(false));
        state.protocol_fees_1 = state.protocol_fees_1.wrapping_add(protocol);
        let growth = mul_div(U256::from(rest), U256::one() << 128, U256::from(liquidity))?;
        state.fee_growth_global_1_x128 =
            wrapping_add(state.fee_growth_global_1_x128.to_wide(), growth).to_host(env);
    }

    set_state(env, &state);

    env.events().publish(
        (Symbol::new(env, "flash"),),
        (sender, recipient, amount0, amount1, paid0, paid1),
    );

    Ok(())
}
