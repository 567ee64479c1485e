use soroban_sdk::{contracttype, Address, Env, U256};

/// Pool state - stored in Instance storage for frequent access
///
/// Holds Slot0 and the global accumulators as a single record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolState {
    /// Current sqrt(price) as Q64.96
    pub sqrt_price_x96: U256,
    /// Current tick index
    pub tick: i32,
    /// Most recently written oracle slot
    pub observation_index: u32,
    /// Number of populated oracle slots
    pub observation_cardinality: u32,
    /// Oracle slots to populate on the next wrap
    pub observation_cardinality_next: u32,
    /// Protocol fee denominators packed as fp0 + (fp1 << 4)
    pub fee_protocol: u32,
    /// Total liquidity currently in range
    pub liquidity: u128,
    /// Fee growth global for token0 (Q128.128)
    pub fee_growth_global_0_x128: U256,
    /// Fee growth global for token1 (Q128.128)
    pub fee_growth_global_1_x128: U256,
    /// Protocol fees accumulated for token0
    pub protocol_fees_0: u128,
    /// Protocol fees accumulated for token1
    pub protocol_fees_1: u128,
}

impl PoolState {
    pub fn new(
        env: &Env,
        sqrt_price_x96: U256,
        tick: i32,
        observation_cardinality: u32,
        observation_cardinality_next: u32,
    ) -> Self {
        Self {
            sqrt_price_x96,
            tick,
            observation_index: 0,
            observation_cardinality,
            observation_cardinality_next,
            fee_protocol: 0,
            liquidity: 0,
            fee_growth_global_0_x128: U256::from_u32(env, 0),
            fee_growth_global_1_x128: U256::from_u32(env, 0),
            protocol_fees_0: 0,
            protocol_fees_1: 0,
        }
    }

    /// Protocol fee denominator for the input token of a swap
    pub fn fee_protocol_for(&self, zero_for_one: bool) -> u32 {
        if zero_for_one {
            self.fee_protocol % 16
        } else {
            self.fee_protocol >> 4
        }
    }
}

/// Pool configuration - immutable after creation
#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Factory contract address, administers protocol fees
    pub factory: Address,
    /// Token0 address (lower address)
    pub token0: Address,
    /// Token1 address (higher address)
    pub token1: Address,
    /// Fee tier in hundredths of bps
    pub fee: u32,
    /// Tick spacing for this pool
    pub tick_spacing: i32,
    /// Maximum liquidity per tick
    pub max_liquidity_per_tick: u128,
}

/// Public view of the price slot
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub observation_index: u32,
    pub observation_cardinality: u32,
    pub observation_cardinality_next: u32,
    pub fee_protocol: u32,
    /// False while a mutating operation holds the pool lock
    pub unlocked: bool,
}

impl Slot0 {
    pub fn from_state(state: &PoolState, unlocked: bool) -> Self {
        Self {
            sqrt_price_x96: state.sqrt_price_x96.clone(),
            tick: state.tick,
            observation_index: state.observation_index,
            observation_cardinality: state.observation_cardinality,
            observation_cardinality_next: state.observation_cardinality_next,
            fee_protocol: state.fee_protocol,
            unlocked,
        }
    }
}

/// Protocol fees pending withdrawal
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_empty() {
        let env = Env::default();
        let price = U256::from_u128(&env, crate::Q96);
        let state = PoolState::new(&env, price.clone(), 0, 1, 1);

        assert_eq!(state.sqrt_price_x96, price);
        assert_eq!(state.liquidity, 0);
        assert_eq!(state.fee_growth_global_0_x128, U256::from_u32(&env, 0));
        assert_eq!(state.observation_cardinality, 1);
        assert_eq!(state.fee_protocol, 0);
    }

    #[test]
    fn test_fee_protocol_unpacking() {
        let env = Env::default();
        let mut state = PoolState::new(&env, U256::from_u128(&env, crate::Q96), 0, 1, 1);
        state.fee_protocol = 6 + (9 << 4);

        assert_eq!(state.fee_protocol_for(true), 6);
        assert_eq!(state.fee_protocol_for(false), 9);
    }

    #[test]
    fn test_slot0_mirrors_state() {
        let env = Env::default();
        let state = PoolState::new(&env, U256::from_u128(&env, crate::Q96), -5, 1, 3);
        let slot0 = Slot0::from_state(&state, true);

        assert_eq!(slot0.tick, -5);
        assert_eq!(slot0.observation_cardinality_next, 3);
        assert!(slot0.unlocked);
    }
}
