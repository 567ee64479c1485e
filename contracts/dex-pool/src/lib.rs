#![no_std]

mod callback;
mod flash;
pub mod invariants;
mod liquidity;
mod lock;
mod oracle;
mod position;
mod protocol;
mod storage;
mod swap;
mod testutils;
mod tick;
mod tick_bitmap;

#[cfg(feature = "certora")]
pub mod certora_specs;

use dex_math::get_tick_at_sqrt_ratio;
use dex_types::{
    max_liquidity_per_tick, CumulativesInside, Error, Observation, ObserveResult, PoolConfig,
    PoolState, PositionInfo, PositionKey, ProtocolFees, Slot0, TickInfo, ToWide, FEE_DENOMINATOR,
    MAX_TICK_SPACING,
};
use lock::PoolLock;
use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Bytes, Env, Symbol, Vec, U256};
use storage::{
    get_config, get_observation, get_position, get_state, get_tick, get_tick_bitmap_word,
    has_state, is_locked, set_config, set_state,
};

#[contract]
pub struct DexPool;

#[contractimpl]
impl DexPool {
    /// Deploy a pool for `token0`/`token1`
    ///
    /// `factory` administers the protocol fee. The pool holds no price until
    /// `initialize` is called.
    pub fn __constructor(
        env: Env,
        factory: Address,
        token0: Address,
        token1: Address,
        fee: u32,
        tick_spacing: i32,
    ) {
        if token0 >= token1 {
            panic_with_error!(&env, Error::InvalidConfig);
        }
        if tick_spacing <= 0 || tick_spacing >= MAX_TICK_SPACING {
            panic_with_error!(&env, Error::InvalidConfig);
        }
        if fee >= FEE_DENOMINATOR {
            panic_with_error!(&env, Error::InvalidConfig);
        }

        let config = PoolConfig {
            factory,
            token0,
            token1,
            fee,
            tick_spacing,
            max_liquidity_per_tick: max_liquidity_per_tick(tick_spacing),
        };
        set_config(&env, &config);
    }

    /// Set the starting price and open the pool
    pub fn initialize(env: Env, sqrt_price_x96: U256) -> Result<(), Error> {
        let _lock = PoolLock::acquire_uninitialized(&env)?;

        if has_state(&env) {
            return Err(Error::AlreadyInitialized);
        }

        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96.to_wide())?;
        let (cardinality, cardinality_next) = oracle::initialize(&env, env.ledger().timestamp());

        let state = PoolState::new(&env, sqrt_price_x96.clone(), tick, cardinality, cardinality_next);
        set_state(&env, &state);

        env.events()
            .publish((Symbol::new(&env, "initialize"),), (sqrt_price_x96, tick));

        Ok(())
    }

    /// Add liquidity for `recipient`
    ///
    /// # Arguments
    /// * `sender` - Contract paying for the liquidity through `mint_callback`
    /// * `amount` - Liquidity to add
    ///
    /// # Returns
    /// (amount0, amount1) - Token amounts owed to the pool
    pub fn mint(
        env: Env,
        sender: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: Bytes,
    ) -> Result<(i128, i128), Error> {
        sender.require_auth();
        liquidity::mint(&env, sender, recipient, tick_lower, tick_upper, amount, data)
    }

    /// Remove liquidity, crediting the tokens to the position
    ///
    /// # Returns
    /// (amount0, amount1) - Token amounts credited, collectable with `collect`
    pub fn burn(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(i128, i128), Error> {
        owner.require_auth();
        liquidity::burn(&env, owner, tick_lower, tick_upper, amount)
    }

    /// Withdraw tokens owed to a position
    ///
    /// # Returns
    /// (amount0, amount1) - Token amounts transferred to `recipient`
    pub fn collect(
        env: Env,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        owner.require_auth();
        liquidity::collect(
            &env,
            owner,
            recipient,
            tick_lower,
            tick_upper,
            amount0_requested,
            amount1_requested,
        )
    }

    /// Execute a swap
    ///
    /// # Arguments
    /// * `sender` - Contract paying the input through `swap_callback`
    /// * `recipient` - Address to receive output tokens
    /// * `zero_for_one` - True if swapping token0 for token1
    /// * `amount_specified` - Positive for exact input, negative for exact output
    /// * `sqrt_price_limit_x96` - Price the swap may not move past
    ///
    /// # Returns
    /// (amount0, amount1) - Negative values are amounts paid out
    pub fn swap(
        env: Env,
        sender: Address,
        recipient: Address,
        zero_for_one: bool,
        amount_specified: i128,
        sqrt_price_limit_x96: U256,
        data: Bytes,
    ) -> Result<(i128, i128), Error> {
        sender.require_auth();
        swap::swap(
            &env,
            sender,
            recipient,
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96.to_wide(),
            data,
        )
    }

    /// Lend tokens to `recipient` until `sender.flash_callback` returns
    pub fn flash(
        env: Env,
        sender: Address,
        recipient: Address,
        amount0: u128,
        amount1: u128,
        data: Bytes,
    ) -> Result<(), Error> {
        sender.require_auth();
        flash::flash(&env, sender, recipient, amount0, amount1, data)
    }

    /// Grow the oracle ring buffer; slots are populated as the ring wraps
    pub fn increase_obs_cardinality_next(env: Env, next: u32) -> Result<(), Error> {
        let _lock = PoolLock::acquire(&env)?;

        let mut state = get_state(&env)?;
        let old = state.observation_cardinality_next;
        let new = oracle::grow(&env, old, next)?;
        state.observation_cardinality_next = new;
        set_state(&env, &state);

        if old != new {
            env.events().publish(
                (Symbol::new(&env, "increase_obs_cardinality_next"),),
                (old, new),
            );
        }

        Ok(())
    }

    // === Protocol Fees ===

    pub fn set_fee_protocol(env: Env, fee_protocol0: u32, fee_protocol1: u32) -> Result<(), Error> {
        protocol::set_fee_protocol(&env, fee_protocol0, fee_protocol1)
    }

    pub fn collect_protocol(
        env: Env,
        recipient: Address,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        protocol::collect_protocol(&env, recipient, amount0_requested, amount1_requested)
    }

    // === View Functions ===

    pub fn slot0(env: Env) -> Result<Slot0, Error> {
        let state = get_state(&env)?;
        Ok(Slot0::from_state(&state, !is_locked(&env)))
    }

    /// In-range liquidity
    pub fn liquidity(env: Env) -> Result<u128, Error> {
        Ok(get_state(&env)?.liquidity)
    }

    pub fn fee_growth_global_0_x128(env: Env) -> Result<U256, Error> {
        Ok(get_state(&env)?.fee_growth_global_0_x128)
    }

    pub fn fee_growth_global_1_x128(env: Env) -> Result<U256, Error> {
        Ok(get_state(&env)?.fee_growth_global_1_x128)
    }

    pub fn protocol_fees(env: Env) -> Result<ProtocolFees, Error> {
        let state = get_state(&env)?;
        Ok(ProtocolFees {
            token0: state.protocol_fees_0,
            token1: state.protocol_fees_1,
        })
    }

    pub fn ticks(env: Env, tick: i32) -> TickInfo {
        get_tick(&env, tick)
    }

    pub fn tick_bitmap(env: Env, word_pos: i32) -> U256 {
        get_tick_bitmap_word(&env, word_pos)
    }

    pub fn positions(env: Env, owner: Address, tick_lower: i32, tick_upper: i32) -> PositionInfo {
        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        get_position(&env, &key)
    }

    pub fn observations(env: Env, index: u32) -> Observation {
        get_observation(&env, index)
    }

    /// Cumulatives as of each `seconds_ago` before the current ledger time
    pub fn observe(env: Env, seconds_agos: Vec<u64>) -> Result<ObserveResult, Error> {
        let state = get_state(&env)?;
        oracle::observe(
            &env,
            env.ledger().timestamp(),
            &seconds_agos,
            state.tick,
            state.observation_index,
            state.liquidity,
            state.observation_cardinality,
        )
    }

    pub fn snapshot_cumulatives_inside(
        env: Env,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<CumulativesInside, Error> {
        let config = get_config(&env)?;
        let state = get_state(&env)?;
        oracle::snapshot_cumulatives_inside(&env, &config, &state, tick_lower, tick_upper)
    }

    pub fn config(env: Env) -> Result<PoolConfig, Error> {
        get_config(&env)
    }

    pub fn factory(env: Env) -> Result<Address, Error> {
        Ok(get_config(&env)?.factory)
    }

    pub fn token0(env: Env) -> Result<Address, Error> {
        Ok(get_config(&env)?.token0)
    }

    pub fn token1(env: Env) -> Result<Address, Error> {
        Ok(get_config(&env)?.token1)
    }

    pub fn fee(env: Env) -> Result<u32, Error> {
        Ok(get_config(&env)?.fee)
    }

    pub fn tick_spacing(env: Env) -> Result<i32, Error> {
        Ok(get_config(&env)?.tick_spacing)
    }

    pub fn max_liquidity_per_tick(env: Env) -> Result<u128, Error> {
        Ok(get_config(&env)?.max_liquidity_per_tick)
    }
}
