use std::fmt;

use bitcoin::Amount;
use vault_safe_math::{mul_div_ceil, safe_mul, MathError};

use crate::constants::BYTES_PER_KB;

/// Fee rate in satoshis per 1000 bytes of serialized transaction.
///
/// Rates come from the caller already resolved; nothing in this crate estimates them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeeRate(u64);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0);

    pub const fn from_sat_per_kb(sat_per_kb: u64) -> Self {
        FeeRate(sat_per_kb)
    }

    pub fn from_sat_per_vb(sat_per_vb: u64) -> Result<Self, MathError> {
        Ok(FeeRate(safe_mul(sat_per_vb, BYTES_PER_KB)?))
    }

    pub const fn to_sat_per_kb(self) -> u64 {
        self.0
    }

    /// Fee owed by a transaction of `size` bytes, rounded up so the rate is never underpaid.
    pub fn fee_for_size(self, size: usize) -> Result<Amount, MathError> {
        let size = u64::try_from(size).map_err(|_| MathError::ConversionError)?;
        let fee = mul_div_ceil(self.0, size, BYTES_PER_KB)?;

        Ok(Amount::from_sat(fee))
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/kB", self.0)
    }
}
