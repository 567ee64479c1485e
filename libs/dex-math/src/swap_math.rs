use crate::full_math::{mul_div, mul_div_rounding_up};
use crate::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use dex_types::{to_u128, Error, FEE_DENOMINATOR};
use primitive_types::U256;

/// Result of a single swap step computation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapStepResult {
    /// The sqrt price after this step
    pub sqrt_ratio_next_x96: U256,
    /// Amount of input token consumed, excluding fee
    pub amount_in: u128,
    /// Amount of output token produced
    pub amount_out: u128,
    /// Fee amount taken from input
    pub fee_amount: u128,
}

/// Compute the result of swapping within a single tick range
///
/// # Arguments
/// * `sqrt_ratio_current_x96` - Current sqrt price
/// * `sqrt_ratio_target_x96` - Target sqrt price (next tick boundary or price limit)
/// * `liquidity` - Available liquidity in this range
/// * `amount_remaining` - Remaining amount to swap (positive = exact input, negative = exact output)
/// * `fee_pips` - Fee in hundredths of a bip (e.g., 3000 = 0.3%)
///
/// Direction is implied by the target: at or below the current price means zero for one.
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) -> Result<SwapStepResult, Error> {
    if fee_pips >= FEE_DENOMINATOR {
        return Err(Error::InvalidConfig);
    }

    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = amount_remaining >= 0;
    let remaining = U256::from(amount_remaining.unsigned_abs());
    let fee = U256::from(fee_pips);
    let fee_complement = U256::from(FEE_DENOMINATOR - fee_pips);

    let sqrt_ratio_next_x96: U256;
    let mut amount_in = U256::zero();
    let mut amount_out = U256::zero();

    if exact_in {
        let amount_remaining_less_fee =
            mul_div(remaining, fee_complement, U256::from(FEE_DENOMINATOR))?;

        // Input needed to reach the target
        amount_in = if zero_for_one {
            get_amount0_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, true)?
        } else {
            get_amount1_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, true)?
        };

        sqrt_ratio_next_x96 = if amount_remaining_less_fee >= amount_in {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        // Output available up to the target
        amount_out = if zero_for_one {
            get_amount1_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, false)?
        } else {
            get_amount0_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, false)?
        };

        sqrt_ratio_next_x96 = if remaining >= amount_out {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                remaining,
                zero_for_one,
            )?
        };
    }

    let max = sqrt_ratio_target_x96 == sqrt_ratio_next_x96;

    // Recompute whichever side was not pinned by reaching the target
    if zero_for_one {
        if !max || !exact_in {
            amount_in =
                get_amount0_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !max || exact_in {
            amount_out =
                get_amount1_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !max || !exact_in {
            amount_in =
                get_amount1_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, true)?;
        }
        if !max || exact_in {
            amount_out =
                get_amount0_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, false)?;
        }
    }

    // Cap output at remaining for exact output swaps
    if !exact_in && amount_out > remaining {
        amount_out = remaining;
    }

    let fee_amount = if exact_in && sqrt_ratio_next_x96 != sqrt_ratio_target_x96 {
        // Didn't reach target, the remainder is all fee
        remaining - amount_in
    } else {
        mul_div_rounding_up(amount_in, fee, fee_complement)?
    };

    Ok(SwapStepResult {
        sqrt_ratio_next_x96,
        amount_in: to_u128(amount_in)?,
        amount_out: to_u128(amount_out)?,
        fee_amount: to_u128(fee_amount)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_types::Q96;

    const E18: i128 = 1_000_000_000_000_000_000;

    fn dec(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    fn price_1_1() -> U256 {
        U256::from(Q96)
    }

    /// encodePriceSqrt(101, 100)
    fn price_101_100() -> U256 {
        dec("79623317895830914510639640423")
    }

    // === Exact input tests ===

    #[test]
    fn test_exact_in_capped_at_target_one_for_zero() {
        let step = compute_swap_step(price_1_1(), price_101_100(), 2 * E18 as u128, E18, 600)
            .unwrap();

        assert_eq!(step.amount_in, 9975124224178055);
        assert_eq!(step.fee_amount, 5988667735148);
        assert_eq!(step.amount_out, 9925619580021728);
        assert!(step.amount_in + step.fee_amount < E18 as u128, "entire amount is not used");
        assert_eq!(step.sqrt_ratio_next_x96, price_101_100(), "price is capped at target");
    }

    #[test]
    fn test_exact_in_fully_spent_one_for_zero() {
        // encodePriceSqrt(1000, 100)
        let target = dec("250541448375047931186413801569");
        let step = compute_swap_step(price_1_1(), target, 2 * E18 as u128, E18, 600).unwrap();

        assert_eq!(step.amount_in, 999400000000000000);
        assert_eq!(step.fee_amount, 600000000000000);
        assert_eq!(step.amount_out, 666399946655997866);
        assert_eq!(step.amount_in + step.fee_amount, E18 as u128, "entire amount is used");
        assert!(step.sqrt_ratio_next_x96 < target, "price does not reach target");
        assert_eq!(
            step.sqrt_ratio_next_x96,
            dec("118818475322642227089037862318")
        );
    }

    #[test]
    fn test_entire_input_taken_as_fee() {
        let step = compute_swap_step(
            U256::from(2413u32),
            U256::from(79887613182836312u64),
            1985041575832132834610021537970,
            10,
            1872,
        )
        .unwrap();

        assert_eq!(step.amount_in, 0);
        assert_eq!(step.fee_amount, 10);
        assert_eq!(step.amount_out, 0);
        assert_eq!(step.sqrt_ratio_next_x96, U256::from(2413u32));
    }

    // === Exact output tests ===

    #[test]
    fn test_exact_out_capped_at_target_one_for_zero() {
        let step = compute_swap_step(price_1_1(), price_101_100(), 2 * E18 as u128, -E18, 600)
            .unwrap();

        assert_eq!(step.amount_in, 9975124224178055);
        assert_eq!(step.fee_amount, 5988667735148);
        assert_eq!(step.amount_out, 9925619580021728);
        assert!(step.amount_out < E18 as u128, "entire amount out is not returned");
        assert_eq!(step.sqrt_ratio_next_x96, price_101_100());
    }

    #[test]
    fn test_exact_out_fully_received_one_for_zero() {
        // encodePriceSqrt(10000, 100)
        let target = U256::from(Q96) * 10;
        let step = compute_swap_step(price_1_1(), target, 2 * E18 as u128, -E18, 600).unwrap();

        assert_eq!(step.amount_in, 2 * E18 as u128);
        assert_eq!(step.fee_amount, 1200720432259356);
        assert_eq!(step.amount_out, E18 as u128);
        assert!(step.sqrt_ratio_next_x96 < target);
        assert_eq!(
            step.sqrt_ratio_next_x96,
            dec("158456325028528675187087900672")
        );
    }

    #[test]
    fn test_exact_out_capped_at_desired_amount() {
        let step = compute_swap_step(
            dec("417332158212080721273783715441582"),
            dec("1452870262520218020823638996"),
            159344665391607089467575320103,
            -1,
            1,
        )
        .unwrap();

        assert_eq!(step.amount_in, 1);
        assert_eq!(step.fee_amount, 1);
        assert_eq!(step.amount_out, 1, "output never exceeds the request");
        assert_eq!(
            step.sqrt_ratio_next_x96,
            dec("417332158212080721273783715441581")
        );
    }

    #[test]
    fn test_exact_out_insufficient_liquidity_zero_for_one() {
        let price = dec("20282409603651670423947251286016");
        let target = price * 11 / 10;
        let step = compute_swap_step(price, target, 1024, -4, 3000).unwrap();

        assert_eq!(step.amount_out, 0);
        assert_eq!(step.sqrt_ratio_next_x96, target);
        assert_eq!(step.amount_in, 26215);
        assert_eq!(step.fee_amount, 79);
    }

    #[test]
    fn test_exact_out_insufficient_liquidity_one_for_zero() {
        let price = dec("20282409603651670423947251286016");
        let target = price * 9 / 10;
        let step = compute_swap_step(price, target, 1024, -263000, 3000).unwrap();

        assert_eq!(step.amount_out, 26214);
        assert_eq!(step.sqrt_ratio_next_x96, target);
        assert_eq!(step.amount_in, 1);
        assert_eq!(step.fee_amount, 1);
    }

    // === Properties ===

    #[test]
    fn test_step_conserves_value() {
        let targets = [price_101_100(), dec("70000000000000000000000000000")];
        for target in targets {
            for amount in [1_000i128, 1_000_000, E18, -1_000, -E18] {
                let step = compute_swap_step(price_1_1(), target, E18 as u128, amount, 3000)
                    .unwrap();
                if amount > 0 {
                    assert!(step.amount_in + step.fee_amount <= amount as u128);
                } else {
                    assert!(step.amount_out <= amount.unsigned_abs());
                }
            }
        }
    }

    #[test]
    fn test_zero_liquidity_moves_to_target() {
        let step = compute_swap_step(price_1_1(), price_101_100(), 0, E18, 3000).unwrap();

        assert_eq!(step.sqrt_ratio_next_x96, price_101_100());
        assert_eq!(step.amount_in, 0);
        assert_eq!(step.amount_out, 0);
        assert_eq!(step.fee_amount, 0);
    }

    #[test]
    fn test_fee_at_denominator_rejected() {
        assert_eq!(
            compute_swap_step(price_1_1(), price_101_100(), 1, 1, FEE_DENOMINATOR),
            Err(Error::InvalidConfig)
        );
    }
}
