use crate::bit_math::most_significant_bit;
use dex_types::{Error, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use primitive_types::U256;

/// sqrt(1.0001^-(2^i)) in Q128.128, for i = 0..19
const SQRT_RATIO_POWERS: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// log_sqrt(1.0001)(2) in Q128
const LOG_SQRT_10001_FACTOR: u128 = 255738958999603826347141;
/// Error bound subtracted to get the lower tick candidate
const TICK_LOW_OFFSET: u128 = 3402992956809132418596140100660247210;
/// Error bound added to get the upper tick candidate
const TICK_HIGH_OFFSET: u128 = 291339464771989622907027621153398088495;

/// Calculate sqrt(1.0001^tick) * 2^96, rounded up
///
/// Fails with `TickOutOfRange` when |tick| > MAX_TICK.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, Error> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(Error::TickOutOfRange);
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(SQRT_RATIO_POWERS[0])
    } else {
        U256::one() << 128
    };
    for (i, power) in SQRT_RATIO_POWERS.iter().enumerate().skip(1) {
        if abs_tick & (1 << i) != 0 {
            ratio = (ratio * U256::from(*power)) >> 128;
        }
    }

    // the product above is the ratio for -|tick|
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so tick_at(sqrt_at(t)) == t
    let round = if ratio.low_u32() == 0 { 0u8 } else { 1u8 };
    Ok((ratio >> 32) + U256::from(round))
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`
///
/// Fails with `SqrtPriceOutOfRange` unless MIN_SQRT_RATIO <= price < MAX_SQRT_RATIO.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, Error> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(Error::SqrtPriceOutOfRange);
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit(ratio)? as usize;

    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // log2(ratio) in signed Q64.64, kept as two's complement
    let mut log_2 = if msb >= 128 {
        U256::from(msb - 128) << 64
    } else {
        U256::zero().overflowing_sub(U256::from(128 - msb) << 64).0
    };

    for shift in (50..=63).rev() {
        r = (r * r) >> 127;
        let f = r >> 128;
        log_2 = log_2 | (f << shift);
        r = r >> f;
    }

    let log_sqrt10001 = log_2
        .overflowing_mul(U256::from(LOG_SQRT_10001_FACTOR))
        .0;

    let tick_low = signed_high_word(log_sqrt10001.overflowing_sub(U256::from(TICK_LOW_OFFSET)).0);
    let tick_high =
        signed_high_word(log_sqrt10001.overflowing_add(U256::from(TICK_HIGH_OFFSET)).0);

    if tick_low == tick_high {
        Ok(tick_low)
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

/// Arithmetic `x >> 128` of a two's complement value, truncated to i32
fn signed_high_word(x: U256) -> i32 {
    (x >> 128).low_u32() as i32
}

/// Validate that a tick lies within [MIN_TICK, MAX_TICK]
pub fn check_tick(tick: i32) -> Result<(), Error> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Error::TickOutOfRange);
    }
    Ok(())
}
