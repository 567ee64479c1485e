#![cfg(test)]

use crate::{DexPool, DexPoolClient};
use dex_types::{ToHost, MIN_SQRT_RATIO};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::token::{self, StellarAssetClient};
use soroban_sdk::{contract, contractimpl, contracttype, Address, Bytes, Env};

pub const FEE: u32 = 3000;
pub const TICK_SPACING: i32 = 60;

/// Starting balance minted to the callee for each token
pub const FUNDING: i128 = 1_000_000_000_000_000_000_000_000_000;

fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Run `f` inside a freshly deployed pool contract (0.3% fee, spacing 60)
///
/// The tokens are plain addresses, so only storage-level code may run here.
pub fn with_contract<T>(env: &Env, f: impl FnOnce() -> T) -> T {
    let (token0, token1) = sorted(Address::generate(env), Address::generate(env));
    let factory = Address::generate(env);
    let pool = env.register(DexPool, (factory, token0, token1, FEE, TICK_SPACING));
    env.as_contract(&pool, f)
}

// ============================================================================
// Callback contract
// ============================================================================

#[contracttype]
#[derive(Clone)]
enum CalleeKey {
    Pool,
    Token0,
    Token1,
    Shortfall,
    FlashLoan,
    Reenter,
    ReentryRejected,
}

/// Pays whatever the pool asks for out of its own balance
///
/// `set_shortfall` makes every payment fall short by that many units.
#[contract]
pub struct TestCallee;

#[contractimpl]
impl TestCallee {
    pub fn __constructor(env: Env, pool: Address, token0: Address, token1: Address) {
        env.storage().instance().set(&CalleeKey::Pool, &pool);
        env.storage().instance().set(&CalleeKey::Token0, &token0);
        env.storage().instance().set(&CalleeKey::Token1, &token1);
    }

    pub fn set_shortfall(env: Env, shortfall: i128) {
        env.storage().instance().set(&CalleeKey::Shortfall, &shortfall);
    }

    /// Principal to hand back on the next flash callback
    pub fn set_flash_loan(env: Env, amount0: i128, amount1: i128) {
        env.storage()
            .instance()
            .set(&CalleeKey::FlashLoan, &(amount0, amount1));
    }

    /// Try a nested pool swap from inside the next swap callback
    pub fn set_reenter(env: Env, reenter: bool) {
        env.storage().instance().set(&CalleeKey::Reenter, &reenter);
    }

    /// Whether the last nested swap was refused
    pub fn reentry_rejected(env: Env) -> bool {
        env.storage()
            .instance()
            .get(&CalleeKey::ReentryRejected)
            .unwrap_or(false)
    }

    pub fn mint_callback(env: Env, amount0: i128, amount1: i128, _data: Bytes) {
        settle(&env, amount0, amount1);
    }

    pub fn swap_callback(env: Env, amount0: i128, amount1: i128, _data: Bytes) {
        let reenter: bool = env
            .storage()
            .instance()
            .get(&CalleeKey::Reenter)
            .unwrap_or(false);
        if reenter {
            let pool: Address = env.storage().instance().get(&CalleeKey::Pool).unwrap();
            let me = env.current_contract_address();
            let nested = DexPoolClient::new(&env, &pool).try_swap(
                &me,
                &me,
                &true,
                &1000,
                &(MIN_SQRT_RATIO + 1).to_host(&env),
                &Bytes::new(&env),
            );
            env.storage()
                .instance()
                .set(&CalleeKey::ReentryRejected, &nested.is_err());
        }
        settle(&env, amount0, amount1);
    }

    pub fn flash_callback(env: Env, fee0: i128, fee1: i128, _data: Bytes) {
        let (amount0, amount1): (i128, i128) = env
            .storage()
            .instance()
            .get(&CalleeKey::FlashLoan)
            .unwrap_or((0, 0));
        settle(&env, amount0 + fee0, amount1 + fee1);
    }
}

fn settle(env: &Env, amount0: i128, amount1: i128) {
    let pool: Address = env.storage().instance().get(&CalleeKey::Pool).unwrap();
    let shortfall: i128 = env
        .storage()
        .instance()
        .get(&CalleeKey::Shortfall)
        .unwrap_or(0);
    let token0: Address = env.storage().instance().get(&CalleeKey::Token0).unwrap();
    let token1: Address = env.storage().instance().get(&CalleeKey::Token1).unwrap();

    let me = env.current_contract_address();
    if amount0 > 0 {
        token::Client::new(env, &token0).transfer(&me, &pool, &(amount0 - shortfall));
    }
    if amount1 > 0 {
        token::Client::new(env, &token1).transfer(&me, &pool, &(amount1 - shortfall));
    }
}

// ============================================================================
// Pool fixture
// ============================================================================

/// A pool over two Stellar asset tokens, with a funded callee
pub struct PoolFixture<'a> {
    pub env: Env,
    pub pool: DexPoolClient<'a>,
    pub callee: TestCalleeClient<'a>,
    pub factory: Address,
    pub token0: token::Client<'a>,
    pub token1: token::Client<'a>,
}

impl<'a> PoolFixture<'a> {
    pub fn new(env: &Env) -> Self {
        Self::with_fee(env, FEE, TICK_SPACING)
    }

    pub fn with_fee(env: &Env, fee: u32, tick_spacing: i32) -> Self {
        env.mock_all_auths();

        let admin = Address::generate(env);
        let (token0, token1) = sorted(
            env.register_stellar_asset_contract_v2(admin.clone()).address(),
            env.register_stellar_asset_contract_v2(admin).address(),
        );

        let factory = Address::generate(env);
        let pool_id = env.register(
            DexPool,
            (factory.clone(), token0.clone(), token1.clone(), fee, tick_spacing),
        );
        let callee_id = env.register(TestCallee, (pool_id.clone(), token0.clone(), token1.clone()));

        StellarAssetClient::new(env, &token0).mint(&callee_id, &FUNDING);
        StellarAssetClient::new(env, &token1).mint(&callee_id, &FUNDING);

        Self {
            env: env.clone(),
            pool: DexPoolClient::new(env, &pool_id),
            callee: TestCalleeClient::new(env, &callee_id),
            factory,
            token0: token::Client::new(env, &token0),
            token1: token::Client::new(env, &token1),
        }
    }

    pub fn data(&self) -> Bytes {
        Bytes::new(&self.env)
    }

    /// Mint `amount` of liquidity for `owner`, paid by the callee
    pub fn mint(&self, owner: &Address, tick_lower: i32, tick_upper: i32, amount: u128) -> (i128, i128) {
        self.pool.mint(
            &self.callee.address,
            owner,
            &tick_lower,
            &tick_upper,
            &amount,
            &self.data(),
        )
    }

    /// Swap with the callee as payer and `recipient` receiving the output
    pub fn swap(
        &self,
        recipient: &Address,
        zero_for_one: bool,
        amount_specified: i128,
        sqrt_price_limit_x96: &soroban_sdk::U256,
    ) -> (i128, i128) {
        self.pool.swap(
            &self.callee.address,
            recipient,
            &zero_for_one,
            &amount_specified,
            sqrt_price_limit_x96,
            &self.data(),
        )
    }

    pub fn pool_balances(&self) -> (i128, i128) {
        (
            self.token0.balance(&self.pool.address),
            self.token1.balance(&self.pool.address),
        )
    }
}
