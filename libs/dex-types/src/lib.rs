#![no_std]

mod error;
mod oracle;
mod pool;
mod position;
mod tick;
mod wide;

pub use error::*;
pub use oracle::*;
pub use pool::*;
pub use position::*;
pub use tick::*;
pub use wide::*;

use primitive_types::U256;

/// Q96 constant (2^96) for fixed-point math
pub const Q96: u128 = 1 << 96;

/// Minimum tick index, log base sqrt(1.0001) of 2^-128
pub const MIN_TICK: i32 = -887272;

/// Maximum tick index, log base sqrt(1.0001) of 2^128
pub const MAX_TICK: i32 = -MIN_TICK;

/// Minimum sqrt price (at MIN_TICK), Q64.96
pub const MIN_SQRT_RATIO: U256 = U256([4295128739, 0, 0, 0]);

/// Maximum sqrt price (at MAX_TICK), Q64.96
/// 1461446703485210103287273052203988822378723970342
pub const MAX_SQRT_RATIO: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

/// Fee denominator (pips)
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Largest tick spacing accepted by a pool
pub const MAX_TICK_SPACING: i32 = 16384;

/// Oracle ring buffer capacity
pub const MAX_OBSERVATION_CARDINALITY: u32 = 65535;

/// Calculate maximum liquidity per tick for a given tick spacing
///
/// Usable ticks are MIN_TICK / MAX_TICK truncated toward zero onto the spacing grid.
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_liquidity_per_tick_fee_tiers() {
        assert_eq!(
            max_liquidity_per_tick(10),
            1917569901783203986719870431555990
        );
        assert_eq!(
            max_liquidity_per_tick(60),
            11505743598341114571880798222544994
        );
        assert_eq!(
            max_liquidity_per_tick(200),
            38350317471085141830651933667504588
        );
    }

    #[test]
    fn test_max_liquidity_per_tick_entire_range() {
        // spacing of MAX_TICK leaves only three usable ticks
        assert_eq!(max_liquidity_per_tick(MAX_TICK), u128::MAX / 3);
    }

    #[test]
    fn test_max_liquidity_per_tick_spacing_one() {
        assert_eq!(
            max_liquidity_per_tick(1),
            u128::MAX / (2 * MAX_TICK as u128 + 1)
        );
    }

    #[test]
    fn test_sqrt_ratio_bounds() {
        assert_eq!(MIN_SQRT_RATIO, U256::from(4295128739u64));
        assert_eq!(
            MAX_SQRT_RATIO,
            U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap()
        );
        assert!(MIN_SQRT_RATIO < U256::from(Q96) && U256::from(Q96) < MAX_SQRT_RATIO);
    }
}
