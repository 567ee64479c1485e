use crate::storage::{get_position, set_position};
use dex_math::{add_delta, mul_div, wrapping_sub};
use dex_types::{Error, PositionInfo, PositionKey, ToHost, ToWide};
use primitive_types::U256;
use soroban_sdk::Env;

fn q128() -> U256 {
    U256::one() << 128
}

/// Fees earned per unit of liquidity since the last checkpoint, truncated to u128
///
/// The owed counters are allowed to wrap; owners must collect before they do.
fn fees_owed(fee_growth_inside: U256, fee_growth_inside_last: U256, liquidity: u128) -> Result<u128, Error> {
    let growth = wrapping_sub(fee_growth_inside, fee_growth_inside_last);
    let owed = mul_div(growth, U256::from(liquidity), q128())?;
    Ok(owed.low_u128())
}

/// Credit accumulated fees to a position and apply a liquidity delta
///
/// A zero delta is a poke: it only settles fees and requires existing liquidity.
pub fn update(
    env: &Env,
    key: &PositionKey,
    liquidity_delta: i128,
    fee_growth_inside_0_x128: U256,
    fee_growth_inside_1_x128: U256,
) -> Result<PositionInfo, Error> {
    let mut info = get_position(env, key);

    let liquidity_next = if liquidity_delta == 0 {
        if info.liquidity == 0 {
            return Err(Error::NoLiquidityToUpdate);
        }
        info.liquidity
    } else {
        add_delta(info.liquidity, liquidity_delta).map_err(|e| match e {
            Error::LiquidityUnderflow => Error::NoLiquidityToUpdate,
            other => other,
        })?
    };

    let owed_0 = fees_owed(
        fee_growth_inside_0_x128,
        info.fee_growth_inside_0_last_x128.to_wide(),
        info.liquidity,
    )?;
    let owed_1 = fees_owed(
        fee_growth_inside_1_x128,
        info.fee_growth_inside_1_last_x128.to_wide(),
        info.liquidity,
    )?;

    info.liquidity = liquidity_next;
    info.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128.to_host(env);
    info.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128.to_host(env);
    if owed_0 > 0 || owed_1 > 0 {
        info.tokens_owed_0 = info.tokens_owed_0.wrapping_add(owed_0);
        info.tokens_owed_1 = info.tokens_owed_1.wrapping_add(owed_1);
    }

    set_position(env, key, &info);

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::with_contract;
    use soroban_sdk::testutils::Address as _;
    use soroban_sdk::Address;

    fn key(env: &Env) -> PositionKey {
        PositionKey {
            owner: Address::generate(env),
            tick_lower: -60,
            tick_upper: 60,
        }
    }

    #[test]
    fn test_poke_on_empty_position_fails() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            assert_eq!(
                update(&env, &key, 0, U256::zero(), U256::zero()),
                Err(Error::NoLiquidityToUpdate)
            );
        });
    }

    #[test]
    fn test_removing_more_than_owned_fails() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            update(&env, &key, 100, U256::zero(), U256::zero()).unwrap();
            assert_eq!(
                update(&env, &key, -101, U256::zero(), U256::zero()),
                Err(Error::NoLiquidityToUpdate)
            );
        });
    }

    #[test]
    fn test_fees_accrue_pro_rata() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            update(&env, &key, 1000, U256::zero(), U256::zero()).unwrap();

            // 5 token0 and 2 token1 per unit of liquidity, in Q128
            let growth_0 = q128() * 5;
            let growth_1 = q128() * 2;
            let info = update(&env, &key, 0, growth_0, growth_1).unwrap();

            assert_eq!(info.liquidity, 1000);
            assert_eq!(info.tokens_owed_0, 5000);
            assert_eq!(info.tokens_owed_1, 2000);
            assert_eq!(info.fee_growth_inside_0_last_x128.to_wide(), growth_0);
        });
    }

    #[test]
    fn test_fees_are_not_double_counted() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            update(&env, &key, 10, U256::zero(), U256::zero()).unwrap();
            update(&env, &key, 0, q128(), U256::zero()).unwrap();
            let info = update(&env, &key, 0, q128(), U256::zero()).unwrap();
            assert_eq!(info.tokens_owed_0, 10);
        });
    }

    #[test]
    fn test_fee_growth_wraparound_still_credits() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            let start = U256::MAX - q128() + 1;
            update(&env, &key, 7, start, U256::zero()).unwrap();
            // growth wraps past zero by exactly one Q128 unit
            let info = update(&env, &key, 0, U256::zero(), U256::zero()).unwrap();
            assert_eq!(info.tokens_owed_0, 7);
        });
    }

    #[test]
    fn test_fully_drained_position_is_removed() {
        let env = Env::default();
        with_contract(&env, || {
            let key = key(&env);
            update(&env, &key, 10, U256::zero(), U256::zero()).unwrap();
            update(&env, &key, -10, U256::zero(), U256::zero()).unwrap();
            let stored = get_position(&env, &key);
            assert_eq!(stored, PositionInfo::new(&env));
        });
    }
}
