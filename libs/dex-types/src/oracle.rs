use soroban_sdk::{contracttype, Env, Vec, U256};

/// A single oracle observation
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Observation {
    /// Ledger timestamp of the observation
    pub block_timestamp: u64,
    /// Tick index accumulated over time since initialization
    pub tick_cumulative: i64,
    /// Seconds per in-range liquidity (spl) accumulated since initialization (Q128.128)
    pub spl_cumulative_x128: U256,
    /// Whether the slot has been written
    pub initialized: bool,
}

impl Observation {
    pub fn new(env: &Env) -> Self {
        Self {
            block_timestamp: 0,
            tick_cumulative: 0,
            spl_cumulative_x128: U256::from_u32(env, 0),
            initialized: false,
        }
    }
}

/// Cumulatives at each requested `seconds_ago`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObserveResult {
    pub tick_cumulatives: Vec<i64>,
    pub spl_cumulative_x128s: Vec<U256>,
}

/// Cumulatives accrued while the price was inside a tick range
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CumulativesInside {
    pub tick_cumulative_inside: i64,
    pub spl_inside_x128: U256,
    pub seconds_inside: u64,
}
