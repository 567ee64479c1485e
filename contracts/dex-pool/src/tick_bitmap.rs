use crate::storage::{get_tick_bitmap_word, set_tick_bitmap_word};
use dex_math::{least_significant_bit, most_significant_bit};
use dex_types::{Error, ToHost, ToWide};
use primitive_types::U256;
use soroban_sdk::Env;

// 256 compressed ticks per word

/// Word index and bit index for a compressed tick
pub fn position(compressed: i32) -> (i32, u8) {
    let word_pos = compressed >> 8;
    let bit_pos = (compressed & 0xff) as u8;
    (word_pos, bit_pos)
}

/// Tick divided by spacing, rounded toward negative infinity
fn compress(tick: i32, tick_spacing: i32) -> i32 {
    let compressed = tick / tick_spacing;
    if tick < 0 && tick % tick_spacing != 0 {
        compressed - 1
    } else {
        compressed
    }
}

fn load_word(env: &Env, word_pos: i32) -> U256 {
    get_tick_bitmap_word(env, word_pos).to_wide()
}

/// Flip a tick in the bitmap
pub fn flip_tick(env: &Env, tick: i32, tick_spacing: i32) -> Result<(), Error> {
    if tick % tick_spacing != 0 {
        return Err(Error::TickNotSpaced);
    }

    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let mask = U256::one() << bit_pos;
    let word = load_word(env, word_pos) ^ mask;
    set_tick_bitmap_word(env, word_pos, &word.to_host(env));
    Ok(())
}

/// Find the next initialized tick within one word
///
/// Searching left (`lte`) includes the current tick; searching right starts
/// one tick above it. When nothing is initialized the word boundary is
/// returned with `false`, which is a valid tick to step to.
pub fn next_initialized_tick_within_one_word(
    env: &Env,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), Error> {
    let compressed = compress(tick, tick_spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);

        // all the 1s at or to the right of the current bit
        let mask = (U256::one() << bit_pos) - 1 + (U256::one() << bit_pos);
        let masked = load_word(env, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            let msb = most_significant_bit(masked)? as i32;
            (compressed - (bit_pos as i32 - msb)) * tick_spacing
        } else {
            (compressed - bit_pos as i32) * tick_spacing
        };

        Ok((next, initialized))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);

        // all the 1s at or to the left of the bit
        let mask = !((U256::one() << bit_pos) - 1);
        let masked = load_word(env, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            let lsb = least_significant_bit(masked)? as i32;
            (compressed + 1 + (lsb - bit_pos as i32)) * tick_spacing
        } else {
            (compressed + 1 + (255 - bit_pos as i32)) * tick_spacing
        };

        Ok((next, initialized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::with_contract;

    fn is_initialized(env: &Env, tick: i32, tick_spacing: i32) -> bool {
        let (word_pos, bit_pos) = position(compress(tick, tick_spacing));
        !(load_word(env, word_pos) & (U256::one() << bit_pos)).is_zero()
    }

    fn init_ticks(env: &Env, ticks: &[i32]) {
        for tick in ticks {
            flip_tick(env, *tick, 1).unwrap();
        }
    }

    const TICKS: [i32; 9] = [-200, -55, -4, 70, 78, 84, 139, 240, 535];

    // === flip_tick tests ===

    #[test]
    fn test_flip_tick_sets_and_clears() {
        let env = Env::default();
        with_contract(&env, || {
            assert!(!is_initialized(&env, 1, 1));
            flip_tick(&env, 1, 1).unwrap();
            assert!(is_initialized(&env, 1, 1));
            flip_tick(&env, 1, 1).unwrap();
            assert!(!is_initialized(&env, 1, 1));
        });
    }

    #[test]
    fn test_flip_tick_only_touches_its_bit() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, -230, 1).unwrap();
            assert!(is_initialized(&env, -230, 1));
            assert!(!is_initialized(&env, -231, 1));
            assert!(!is_initialized(&env, -229, 1));
            assert!(!is_initialized(&env, -230 + 256, 1));
            assert!(!is_initialized(&env, -230 - 256, 1));
        });
    }

    #[test]
    fn test_flip_tick_rejects_misaligned_tick() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(flip_tick(&env, 61, 60), Err(Error::TickNotSpaced));
        });
    }

    #[test]
    fn test_zero_word_is_removed() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, 300, 1).unwrap();
            flip_tick(&env, 300, 1).unwrap();
            let key = crate::storage::DataKey::TickBitmap(1);
            assert!(!env.storage().persistent().has(&key));
        });
    }

    // === next_initialized_tick_within_one_word, lte = false ===

    #[test]
    fn test_next_right_returns_tick_to_right_if_at_initialized_tick() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            assert_eq!(next_initialized_tick_within_one_word(&env, 78, 1, false), Ok((84, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -55, 1, false), Ok((-4, true)));
        });
    }

    #[test]
    fn test_next_right_returns_directly_adjacent_tick() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            assert_eq!(next_initialized_tick_within_one_word(&env, 77, 1, false), Ok((78, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -56, 1, false), Ok((-55, true)));
        });
    }

    #[test]
    fn test_next_right_stops_at_word_boundary() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            assert_eq!(next_initialized_tick_within_one_word(&env, 255, 1, false), Ok((511, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 383, 1, false), Ok((511, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 508, 1, false), Ok((511, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -257, 1, false), Ok((-200, true)));
        });
    }

    // === next_initialized_tick_within_one_word, lte = true ===

    #[test]
    fn test_next_left_returns_same_tick_if_initialized() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            assert_eq!(next_initialized_tick_within_one_word(&env, 78, 1, true), Ok((78, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 79, 1, true), Ok((78, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 72, 1, true), Ok((70, true)));
        });
    }

    #[test]
    fn test_next_left_stops_at_word_boundary() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            assert_eq!(next_initialized_tick_within_one_word(&env, 258, 1, true), Ok((256, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 256, 1, true), Ok((256, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -257, 1, true), Ok((-512, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 1023, 1, true), Ok((768, false)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 900, 1, true), Ok((768, false)));
        });
    }

    #[test]
    fn test_next_left_boundary_is_initialized() {
        let env = Env::default();
        with_contract(&env, || {
            init_ticks(&env, &TICKS);
            flip_tick(&env, 329, 1).unwrap();
            assert_eq!(next_initialized_tick_within_one_word(&env, 456, 1, true), Ok((329, true)));
        });
    }

    #[test]
    fn test_negative_ticks_round_down_with_spacing() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, -120, 60).unwrap();
            flip_tick(&env, 600, 60).unwrap();
            assert_eq!(next_initialized_tick_within_one_word(&env, -61, 60, true), Ok((-120, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -60, 60, true), Ok((-120, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, -121, 60, false), Ok((-120, true)));
            assert_eq!(next_initialized_tick_within_one_word(&env, 0, 60, false), Ok((600, true)));
        });
    }
}
