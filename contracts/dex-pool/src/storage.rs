use dex_types::{Error, Observation, PoolConfig, PoolState, PositionInfo, PositionKey, TickInfo};
use soroban_sdk::{contracttype, Env, U256};

// ============================================================================
// Storage layout
// ============================================================================
// - Instance: pool config, pool state (slot0 + global accumulators), lock flag
// - Persistent: one entry per tick, bitmap word, position and oracle slot
//
// Empty ticks, zero bitmap words and drained positions are removed instead
// of being written back, so the footprint tracks live liquidity only.
// ============================================================================

/// Storage keys for the pool contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Pool configuration (Instance storage)
    Config,
    /// Current pool state (Instance storage)
    State,
    /// Set while a mutating operation is in progress (Instance storage)
    Locked,
    /// Tick data: tick_index -> TickInfo (Persistent storage)
    Tick(i32),
    /// Tick bitmap: word_position -> 256-bit word (Persistent storage)
    TickBitmap(i32),
    /// Position data: PositionKey -> PositionInfo (Persistent storage)
    Position(PositionKey),
    /// Oracle ring buffer slot -> Observation (Persistent storage)
    Observation(u32),
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

/// Extend instance storage TTL
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

/// Extend persistent storage TTL for a key
pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Config ===

/// Config is written by the constructor, so it is always present once deployed
pub fn get_config(env: &Env) -> Result<PoolConfig, Error> {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::InvalidConfig)
}

pub fn set_config(env: &Env, config: &PoolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

// === State ===

pub fn get_state(env: &Env) -> Result<PoolState, Error> {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .ok_or(Error::NotInitialized)
}

pub fn has_state(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::State)
}

pub fn set_state(env: &Env, state: &PoolState) {
    env.storage().instance().set(&DataKey::State, state);
    extend_instance_ttl(env);
}

// === Lock ===

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Locked)
}

pub fn set_locked(env: &Env, locked: bool) {
    if locked {
        env.storage().instance().set(&DataKey::Locked, &true);
    } else {
        env.storage().instance().remove(&DataKey::Locked);
    }
}

// === Tick ===

pub fn get_tick(env: &Env, tick: i32) -> TickInfo {
    let key = DataKey::Tick(tick);
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| TickInfo::new(env))
}

pub fn set_tick(env: &Env, tick: i32, info: &TickInfo) {
    let key = DataKey::Tick(tick);
    if info.liquidity_gross == 0 && !info.initialized {
        // Remove empty tick
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, info);
        extend_persistent_ttl(env, &key);
    }
}

pub fn remove_tick(env: &Env, tick: i32) {
    env.storage().persistent().remove(&DataKey::Tick(tick));
}

// === Tick Bitmap ===

pub fn get_tick_bitmap_word(env: &Env, word_pos: i32) -> U256 {
    let key = DataKey::TickBitmap(word_pos);
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| U256::from_u32(env, 0))
}

pub fn set_tick_bitmap_word(env: &Env, word_pos: i32, bitmap: &U256) {
    let key = DataKey::TickBitmap(word_pos);
    if *bitmap == U256::from_u32(env, 0) {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, bitmap);
        extend_persistent_ttl(env, &key);
    }
}

// === Position ===

pub fn get_position(env: &Env, key: &PositionKey) -> PositionInfo {
    let data_key = DataKey::Position(key.clone());
    env.storage()
        .persistent()
        .get(&data_key)
        .unwrap_or_else(|| PositionInfo::new(env))
}

pub fn set_position(env: &Env, key: &PositionKey, info: &PositionInfo) {
    let data_key = DataKey::Position(key.clone());
    if info.is_empty() {
        // Remove empty position
        env.storage().persistent().remove(&data_key);
    } else {
        env.storage().persistent().set(&data_key, info);
        extend_persistent_ttl(env, &data_key);
    }
}

// === Observation ===

pub fn get_observation(env: &Env, index: u32) -> Observation {
    let key = DataKey::Observation(index);
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| Observation::new(env))
}

pub fn set_observation(env: &Env, index: u32, observation: &Observation) {
    let key = DataKey::Observation(index);
    env.storage().persistent().set(&key, observation);
    extend_persistent_ttl(env, &key);
}
