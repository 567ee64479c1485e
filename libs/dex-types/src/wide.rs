//! Bridges between the host `U256` (storage and contract arguments) and
//! `primitive_types::U256` (arithmetic).

use crate::Error;
use primitive_types::U256;
use soroban_sdk::Env;

/// Convert a host integer into its arithmetic form
pub trait ToWide {
    fn to_wide(&self) -> U256;
}

/// Convert an arithmetic integer back into a host value
pub trait ToHost {
    fn to_host(&self, env: &Env) -> soroban_sdk::U256;
}

impl ToWide for soroban_sdk::U256 {
    fn to_wide(&self) -> U256 {
        let mut buf = [0u8; 32];
        self.to_be_bytes().copy_into_slice(&mut buf);
        U256::from_big_endian(&buf)
    }
}

impl ToHost for U256 {
    fn to_host(&self, env: &Env) -> soroban_sdk::U256 {
        let limbs = self.0;
        soroban_sdk::U256::from_parts(env, limbs[3], limbs[2], limbs[1], limbs[0])
    }
}

/// Narrow to u128, failing on overflow
pub fn to_u128(value: U256) -> Result<u128, Error> {
    if value.bits() > 128 {
        return Err(Error::MathOverflow);
    }
    Ok(value.as_u128())
}

/// Narrow to a non-negative i128 token amount, failing on overflow
pub fn to_i128(value: U256) -> Result<i128, Error> {
    let v = to_u128(value)?;
    i128::try_from(v).map_err(|_| Error::MathOverflow)
}
