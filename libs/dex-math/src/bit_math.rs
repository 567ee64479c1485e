use dex_types::Error;
use primitive_types::U256;

/// Index of the most significant set bit, 2^msb <= x < 2^(msb+1)
pub fn most_significant_bit(x: U256) -> Result<u8, Error> {
    if x.is_zero() {
        return Err(Error::MathOverflow);
    }
    Ok((255 - x.leading_zeros()) as u8)
}

/// Index of the least significant set bit, x % 2^lsb == 0 and x % 2^(lsb+1) != 0
pub fn least_significant_bit(x: U256) -> Result<u8, Error> {
    if x.is_zero() {
        return Err(Error::MathOverflow);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_powers_of_two() {
        for i in 0..=255u32 {
            let x = U256::one() << i;
            assert_eq!(most_significant_bit(x), Ok(i as u8));
            // all lower bits set leaves the msb unchanged
            assert_eq!(most_significant_bit(x | (x - 1)), Ok(i as u8));
        }
    }

    #[test]
    fn test_lsb_powers_of_two() {
        for i in 0..=255u32 {
            let x = U256::one() << i;
            assert_eq!(least_significant_bit(x), Ok(i as u8));
            // higher bits set leave the lsb unchanged
            assert_eq!(least_significant_bit(U256::MAX << i), Ok(i as u8));
        }
    }

    #[test]
    fn test_extremes() {
        assert_eq!(most_significant_bit(U256::one()), Ok(0));
        assert_eq!(most_significant_bit(U256::MAX), Ok(255));
        assert_eq!(least_significant_bit(U256::one()), Ok(0));
        assert_eq!(least_significant_bit(U256::MAX), Ok(0));
    }

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(most_significant_bit(U256::zero()), Err(Error::MathOverflow));
        assert_eq!(least_significant_bit(U256::zero()), Err(Error::MathOverflow));
    }
}
