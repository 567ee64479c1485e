//! Time-weighted price and liquidity oracle.
//!
//! Observations live in a ring buffer of `cardinality` persistent slots. Each
//! slot records the running tick sum and seconds-per-liquidity sum at a ledger
//! timestamp; any past value inside the window is recovered by interpolating
//! between the two surrounding slots.

use crate::liquidity::check_ticks;
use crate::storage::{get_observation, get_tick, set_observation};
use dex_math::{mul_div, wrapping_add, wrapping_sub};
use dex_types::{
    CumulativesInside, Error, Observation, ObserveResult, PoolConfig, PoolState, ToHost, ToWide,
    MAX_OBSERVATION_CARDINALITY,
};
use primitive_types::U256;
use soroban_sdk::{Env, Vec};

/// Accumulate an observation forward to `time`
pub fn transform(
    env: &Env,
    last: &Observation,
    time: u64,
    tick: i32,
    liquidity: u128,
) -> Observation {
    let delta = time.wrapping_sub(last.block_timestamp);
    let divisor = U256::from(liquidity.max(1));
    let seconds_per_liquidity = (U256::from(delta) << 128) / divisor;

    Observation {
        block_timestamp: time,
        tick_cumulative: last
            .tick_cumulative
            .wrapping_add((tick as i64).wrapping_mul(delta as i64)),
        spl_cumulative_x128: wrapping_add(
            last.spl_cumulative_x128.to_wide(),
            seconds_per_liquidity,
        )
        .to_host(env),
        initialized: true,
    }
}

/// Write the first observation; returns (cardinality, cardinality_next)
pub fn initialize(env: &Env, time: u64) -> (u32, u32) {
    let first = Observation {
        block_timestamp: time,
        tick_cumulative: 0,
        spl_cumulative_x128: soroban_sdk::U256::from_u32(env, 0),
        initialized: true,
    };
    set_observation(env, 0, &first);
    (1, 1)
}

/// Record the state as of `time`, at most once per timestamp
///
/// Returns the updated (index, cardinality).
pub fn write(
    env: &Env,
    index: u32,
    time: u64,
    tick: i32,
    liquidity: u128,
    cardinality: u32,
    cardinality_next: u32,
) -> (u32, u32) {
    let last = get_observation(env, index);

    if last.block_timestamp == time {
        return (index, cardinality);
    }

    // grow only once the ring is about to wrap
    let cardinality_updated = if cardinality_next > cardinality && index == cardinality - 1 {
        cardinality_next
    } else {
        cardinality
    };

    let index_updated = (index + 1) % cardinality_updated;
    let observation = transform(env, &last, time, tick, liquidity);
    set_observation(env, index_updated, &observation);

    (index_updated, cardinality_updated)
}

/// Prepare slots up to `next`; returns the new cardinality_next
pub fn grow(env: &Env, current: u32, next: u32) -> Result<u32, Error> {
    if current == 0 {
        return Err(Error::ObservationCardinalityZero);
    }
    let next = next.min(MAX_OBSERVATION_CARDINALITY);
    if next <= current {
        return Ok(current);
    }

    // touch each slot so later writes only update existing entries
    for i in current..next {
        let mut slot = Observation::new(env);
        slot.block_timestamp = 1;
        set_observation(env, i, &slot);
    }
    Ok(next)
}

/// Find the observations at or immediately around `target`
fn binary_search(
    env: &Env,
    target: u64,
    index: u32,
    cardinality: u32,
) -> (Observation, Observation) {
    let mut l = (index + 1) % cardinality;
    let mut r = l + cardinality - 1;

    loop {
        let i = (l + r) / 2;

        let before = get_observation(env, i % cardinality);

        // reached an uninitialized slot, search higher
        if !before.initialized {
            l = i + 1;
            continue;
        }

        let at_or_after = get_observation(env, (i + 1) % cardinality);

        let target_at_or_after = before.block_timestamp <= target;

        if target_at_or_after && target <= at_or_after.block_timestamp {
            return (before, at_or_after);
        }

        if !target_at_or_after {
            r = i - 1;
        } else {
            l = i + 1;
        }
    }
}

fn get_surrounding_observations(
    env: &Env,
    target: u64,
    tick: i32,
    index: u32,
    liquidity: u128,
    cardinality: u32,
) -> Result<(Observation, Observation), Error> {
    let newest = get_observation(env, index);

    if newest.block_timestamp <= target {
        if newest.block_timestamp == target {
            return Ok((newest.clone(), newest));
        }
        let projected = transform(env, &newest, target, tick, liquidity);
        return Ok((newest, projected));
    }

    // oldest is the next slot, or slot 0 if the ring has not filled yet
    let mut oldest = get_observation(env, (index + 1) % cardinality);
    if !oldest.initialized {
        oldest = get_observation(env, 0);
    }

    if target < oldest.block_timestamp {
        return Err(Error::ObservationTooOld);
    }

    Ok(binary_search(env, target, index, cardinality))
}

/// Cumulatives as of `seconds_ago` before `time`
pub fn observe_single(
    env: &Env,
    time: u64,
    seconds_ago: u64,
    tick: i32,
    index: u32,
    liquidity: u128,
    cardinality: u32,
) -> Result<(i64, U256), Error> {
    if seconds_ago == 0 {
        let mut last = get_observation(env, index);
        if last.block_timestamp != time {
            last = transform(env, &last, time, tick, liquidity);
        }
        return Ok((
            last.tick_cumulative,
            last.spl_cumulative_x128.to_wide(),
        ));
    }

    let target = time
        .checked_sub(seconds_ago)
        .ok_or(Error::ObservationTooOld)?;

    let (before, after) =
        get_surrounding_observations(env, target, tick, index, liquidity, cardinality)?;

    if target == before.block_timestamp {
        Ok((
            before.tick_cumulative,
            before.spl_cumulative_x128.to_wide(),
        ))
    } else if target == after.block_timestamp {
        Ok((
            after.tick_cumulative,
            after.spl_cumulative_x128.to_wide(),
        ))
    } else {
        // somewhere in between
        let observation_time_delta = after.block_timestamp - before.block_timestamp;
        let target_delta = target - before.block_timestamp;

        let tick_slope = after
            .tick_cumulative
            .wrapping_sub(before.tick_cumulative)
            / observation_time_delta as i64;
        let tick_cumulative = before
            .tick_cumulative
            .wrapping_add(tick_slope.wrapping_mul(target_delta as i64));

        let before_spl = before.spl_cumulative_x128.to_wide();
        let spl_delta = wrapping_sub(
            after.spl_cumulative_x128.to_wide(),
            before_spl,
        );
        let seconds_per_liquidity = wrapping_add(
            before_spl,
            mul_div(
                spl_delta,
                U256::from(target_delta),
                U256::from(observation_time_delta),
            )?,
        );

        Ok((tick_cumulative, seconds_per_liquidity))
    }
}

/// Cumulatives for each entry of `seconds_agos`
pub fn observe(
    env: &Env,
    time: u64,
    seconds_agos: &Vec<u64>,
    tick: i32,
    index: u32,
    liquidity: u128,
    cardinality: u32,
) -> Result<ObserveResult, Error> {
    if cardinality == 0 {
        return Err(Error::ObservationCardinalityZero);
    }

    let mut tick_cumulatives = Vec::new(env);
    let mut spl_cumulative_x128s = Vec::new(env);

    for seconds_ago in seconds_agos.iter() {
        let (tick_cumulative, seconds_per_liquidity) =
            observe_single(env, time, seconds_ago, tick, index, liquidity, cardinality)?;
        tick_cumulatives.push_back(tick_cumulative);
        spl_cumulative_x128s.push_back(seconds_per_liquidity.to_host(env));
    }

    Ok(ObserveResult {
        tick_cumulatives,
        spl_cumulative_x128s,
    })
}

/// Tick cumulative, seconds per liquidity and seconds spent inside a range
///
/// Only differences between two snapshots of the same range are meaningful.
/// Both bounding ticks must be initialized.
pub fn snapshot_cumulatives_inside(
    env: &Env,
    config: &PoolConfig,
    state: &PoolState,
    tick_lower: i32,
    tick_upper: i32,
) -> Result<CumulativesInside, Error> {
    check_ticks(tick_lower, tick_upper, config.tick_spacing)?;

    let lower = get_tick(env, tick_lower);
    let upper = get_tick(env, tick_upper);
    if !lower.initialized || !upper.initialized {
        return Err(Error::TickNotInitialized);
    }

    let spl_lower = lower.spl_outside_x128.to_wide();
    let spl_upper = upper.spl_outside_x128.to_wide();

    let (tick_cumulative_inside, seconds_per_liquidity_inside, seconds_inside) =
        if state.tick < tick_lower {
            (
                lower.tick_cumulative_outside.wrapping_sub(upper.tick_cumulative_outside),
                wrapping_sub(spl_lower, spl_upper),
                lower.seconds_outside.wrapping_sub(upper.seconds_outside),
            )
        } else if state.tick < tick_upper {
            let time = env.ledger().timestamp();
            let (tick_cumulative, seconds_per_liquidity) = observe_single(
                env,
                time,
                0,
                state.tick,
                state.observation_index,
                state.liquidity,
                state.observation_cardinality,
            )?;
            (
                tick_cumulative
                    .wrapping_sub(lower.tick_cumulative_outside)
                    .wrapping_sub(upper.tick_cumulative_outside),
                wrapping_sub(wrapping_sub(seconds_per_liquidity, spl_lower), spl_upper),
                time.wrapping_sub(lower.seconds_outside)
                    .wrapping_sub(upper.seconds_outside),
            )
        } else {
            (
                upper.tick_cumulative_outside.wrapping_sub(lower.tick_cumulative_outside),
                wrapping_sub(spl_upper, spl_lower),
                upper.seconds_outside.wrapping_sub(lower.seconds_outside),
            )
        };

    Ok(CumulativesInside {
        tick_cumulative_inside,
        spl_inside_x128: seconds_per_liquidity_inside.to_host(env),
        seconds_inside,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::with_contract;
    use soroban_sdk::vec;

    /// In-memory view of the oracle slot of a pool
    struct Oracle {
        time: u64,
        tick: i32,
        liquidity: u128,
        index: u32,
        cardinality: u32,
        cardinality_next: u32,
    }

    impl Oracle {
        fn new(env: &Env, time: u64, tick: i32, liquidity: u128) -> Self {
            let (cardinality, cardinality_next) = initialize(env, time);
            Self {
                time,
                tick,
                liquidity,
                index: 0,
                cardinality,
                cardinality_next,
            }
        }

        fn advance(&mut self, seconds: u64) {
            self.time += seconds;
        }

        fn update(&mut self, env: &Env, tick: i32, liquidity: u128) {
            let (index, cardinality) = write(
                env,
                self.index,
                self.time,
                self.tick,
                self.liquidity,
                self.cardinality,
                self.cardinality_next,
            );
            self.index = index;
            self.cardinality = cardinality;
            self.tick = tick;
            self.liquidity = liquidity;
        }

        fn grow(&mut self, env: &Env, next: u32) {
            self.cardinality_next = grow(env, self.cardinality_next, next).unwrap();
        }

        fn observe_single(&self, env: &Env, seconds_ago: u64) -> Result<(i64, U256), Error> {
            observe_single(
                env,
                self.time,
                seconds_ago,
                self.tick,
                self.index,
                self.liquidity,
                self.cardinality,
            )
        }
    }

    fn q128() -> U256 {
        U256::one() << 128
    }

    // === initialize / grow ===

    #[test]
    fn test_initialize_writes_first_slot() {
        let env = Env::default();
        with_contract(&env, || {
            let oracle = Oracle::new(&env, 1, 1, 1);
            assert_eq!(oracle.cardinality, 1);
            assert_eq!(oracle.cardinality_next, 1);

            let first = get_observation(&env, 0);
            assert!(first.initialized);
            assert_eq!(first.block_timestamp, 1);
            assert_eq!(first.tick_cumulative, 0);
        });
    }

    #[test]
    fn test_grow_noop_when_not_larger() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.grow(&env, 1);
            assert_eq!(oracle.cardinality_next, 1);
            oracle.grow(&env, 5);
            oracle.grow(&env, 3);
            assert_eq!(oracle.cardinality_next, 5);
        });
    }

    #[test]
    fn test_grow_touches_new_slots_without_initializing() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.grow(&env, 4);
            for i in 1..4 {
                let slot = get_observation(&env, i);
                assert_eq!(slot.block_timestamp, 1);
                assert!(!slot.initialized);
            }
        });
    }

    #[test]
    fn test_grow_requires_initialized_oracle() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(grow(&env, 0, 5), Err(Error::ObservationCardinalityZero));
        });
    }

    // === write ===

    #[test]
    fn test_write_single_element_array_overwrites() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.advance(1);
            oracle.update(&env, 2, 5);
            assert_eq!(oracle.index, 0);

            let slot = get_observation(&env, 0);
            assert_eq!(slot.block_timestamp, 1);
            assert_eq!(slot.tick_cumulative, 0);
            // liquidity of zero counts as one
            assert_eq!(slot.spl_cumulative_x128.to_wide(), q128());
        });
    }

    #[test]
    fn test_write_same_timestamp_is_noop() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.update(&env, 1, 5);
            assert_eq!(oracle.index, 0);
            let slot = get_observation(&env, 0);
            assert_eq!(slot.block_timestamp, 0);
            assert_eq!(slot.tick_cumulative, 0);
        });
    }

    #[test]
    fn test_write_accumulates_tick_and_liquidity() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.advance(3);
            oracle.update(&env, 2, 5);
            oracle.advance(4);
            oracle.update(&env, -7, 6);
            oracle.advance(5);
            oracle.update(&env, -2, 4);

            let slot = get_observation(&env, 0);
            assert_eq!(slot.block_timestamp, 12);
            // 0*3 + 2*4 + -7*5
            assert_eq!(slot.tick_cumulative, -27);
            let expected = (q128() * 3) + (q128() * 4) / 5 + (q128() * 5) / 6;
            assert_eq!(slot.spl_cumulative_x128.to_wide(), expected);
        });
    }

    #[test]
    fn test_write_grows_cardinality_when_ring_wraps() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.grow(&env, 3);
            oracle.advance(3);
            oracle.update(&env, 1, 2);
            assert_eq!(oracle.cardinality, 3);
            assert_eq!(oracle.index, 1);
            oracle.advance(4);
            oracle.update(&env, 5, 9);
            assert_eq!(oracle.index, 2);
            oracle.advance(1);
            oracle.update(&env, 6, 1);
            assert_eq!(oracle.index, 0, "ring wraps back to the start");

            let slot = get_observation(&env, 0);
            assert_eq!(slot.block_timestamp, 8);
            assert_eq!(slot.tick_cumulative, 9);
        });
    }

    // === observe ===

    #[test]
    fn test_observe_fails_before_initialize() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(
                observe(&env, 0, &vec![&env, 0u64], 0, 0, 0, 0),
                Err(Error::ObservationCardinalityZero)
            );
        });
    }

    #[test]
    fn test_observe_current_extrapolates() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 5, 2, 4);
            oracle.advance(10);
            let (tick_cumulative, seconds_per_liquidity) = oracle.observe_single(&env, 0).unwrap();
            assert_eq!(tick_cumulative, 20);
            assert_eq!(seconds_per_liquidity, (q128() * 10) / 4);
        });
    }

    #[test]
    fn test_observe_older_than_oldest_fails() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 5, 2, 4);
            oracle.advance(10);
            assert!(oracle.observe_single(&env, 10).is_ok());
            assert_eq!(oracle.observe_single(&env, 11), Err(Error::ObservationTooOld));
        });
    }

    #[test]
    fn test_observe_interpolates_between_observations() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.grow(&env, 4);
            oracle.advance(4);
            oracle.update(&env, 10, 1);
            oracle.advance(10);
            oracle.update(&env, 20, 1);
            oracle.advance(6);

            // slots: t=0 (0), t=4 (0), t=14 (100); head at t=20 projects 220
            assert_eq!(oracle.observe_single(&env, 0).unwrap().0, 220);
            assert_eq!(oracle.observe_single(&env, 6).unwrap().0, 100);
            assert_eq!(oracle.observe_single(&env, 11).unwrap().0, 50);
            assert_eq!(oracle.observe_single(&env, 16).unwrap().0, 0);
            assert_eq!(oracle.observe_single(&env, 20).unwrap().0, 0);
            assert_eq!(oracle.observe_single(&env, 3).unwrap().0, 160);
        });
    }

    #[test]
    fn test_observe_after_ring_wraps() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 0, 0);
            oracle.grow(&env, 2);
            for _ in 0..4 {
                oracle.advance(10);
                let next_tick = oracle.tick + 1;
                oracle.update(&env, next_tick, 1);
            }
            // slots hold t=30 and t=40; t=20 is gone
            assert_eq!(oracle.observe_single(&env, 10).unwrap().0, 30);
            assert_eq!(oracle.observe_single(&env, 0).unwrap().0, 60);
            assert_eq!(oracle.observe_single(&env, 5).unwrap().0, 45);
            assert_eq!(oracle.observe_single(&env, 11), Err(Error::ObservationTooOld));
        });
    }

    #[test]
    fn test_observe_many() {
        let env = Env::default();
        with_contract(&env, || {
            let mut oracle = Oracle::new(&env, 0, 3, 0);
            oracle.grow(&env, 2);
            oracle.advance(5);
            let result = observe(
                &env,
                oracle.time,
                &vec![&env, 0u64, 2, 5],
                oracle.tick,
                oracle.index,
                oracle.liquidity,
                oracle.cardinality,
            )
            .unwrap();
            assert_eq!(result.tick_cumulatives, vec![&env, 15i64, 9, 0]);
        });
    }
}
