use dex_types::Error;
use soroban_sdk::{token, Address, Bytes, Env, IntoVal, Symbol};

// Callers of mint, swap and flash must be contracts exposing these entry
// points. They settle what they owe by transferring tokens to the pool.

pub fn mint_callback(env: &Env, sender: &Address, amount0: i128, amount1: i128, data: &Bytes) {
    env.invoke_contract::<()>(
        sender,
        &Symbol::new(env, "mint_callback"),
        (amount0, amount1, data.clone()).into_val(env),
    );
}

pub fn swap_callback(env: &Env, sender: &Address, amount0: i128, amount1: i128, data: &Bytes) {
    env.invoke_contract::<()>(
        sender,
        &Symbol::new(env, "swap_callback"),
        (amount0, amount1, data.clone()).into_val(env),
    );
}

pub fn flash_callback(env: &Env, sender: &Address, fee0: i128, fee1: i128, data: &Bytes) {
    env.invoke_contract::<()>(
        sender,
        &Symbol::new(env, "flash_callback"),
        (fee0, fee1, data.clone()).into_val(env),
    );
}

/// Pool balance of `token`
pub fn balance(env: &Env, token: &Address) -> i128 {
    token::Client::new(env, token).balance(&env.current_contract_address())
}

/// Transfer `amount` of `token` from the pool to `to`
pub fn pay(env: &Env, token: &Address, to: &Address, amount: u128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let amount = i128::try_from(amount).map_err(|_| Error::MathOverflow)?;
    token::Client::new(env, token).transfer(&env.current_contract_address(), to, &amount);
    Ok(())
}
