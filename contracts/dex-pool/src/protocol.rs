use crate::callback::pay;
use crate::invariants::fee_protocol_valid;
use crate::lock::PoolLock;
use crate::storage::{get_config, get_state, set_state};
use dex_types::Error;
use soroban_sdk::{Address, Env, Symbol};

/// Set the protocol's share of swap fees as `1 / fee_protocol` per token
///
/// Zero disables the protocol fee for that token. Only the factory may call this.
pub fn set_fee_protocol(env: &Env, fee_protocol0: u32, fee_protocol1: u32) -> Result<(), Error> {
    let _lock = PoolLock::acquire(env)?;

    let config = get_config(env)?;
    config.factory.require_auth();

    if !fee_protocol_valid(fee_protocol0) || !fee_protocol_valid(fee_protocol1) {
        return Err(Error::InvalidFeeProtocol);
    }

    let mut state = get_state(env)?;
    let old = state.fee_protocol;
    state.fee_protocol = fee_protocol0 + (fee_protocol1 << 4);
    set_state(env, &state);

    env.events().publish(
        (Symbol::new(env, "set_fee_protocol"),),
        (old % 16, old >> 4, fee_protocol0, fee_protocol1),
    );

    Ok(())
}

/// Withdraw accrued protocol fees to `recipient`
pub fn collect_protocol(
    env: &Env,
    recipient: Address,
    amount0_requested: u128,
    amount1_requested: u128,
) -> Result<(u128, u128), Error> {
    let _lock = PoolLock::acquire(env)?;

    let config = get_config(env)?;
    config.factory.require_auth();

    let mut state = get_state(env)?;
    let amount0 = amount0_requested.min(state.protocol_fees_0);
    let amount1 = amount1_requested.min(state.protocol_fees_1);

    state.protocol_fees_0 -= amount0;
    state.protocol_fees_1 -= amount1;
    set_state(env, &state);

    pay(env, &config.token0, &recipient, amount0)?;
    pay(env, &config.token1, &recipient, amount1)?;

    env.events().publish(
        (Symbol::new(env, "collect_protocol"),),
        (recipient, amount0, amount1),
    );

    Ok((amount0, amount1))
}
