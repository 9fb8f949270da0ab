use bitcoin::{absolute::LockTime, transaction::Version};

use crate::constants::{DEFAULT_MAX_FEE_ITERATIONS, DEFAULT_TX_VERSION};

/// Knobs of the [`crate::builder::TransactionBuilder`].
///
/// With the `serde` feature every field is optional when deserializing and falls back to
/// its default.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuilderConfig {
    /// `nVersion` of built transactions.
    pub tx_version: i32,
    /// `nLockTime` of built transactions, in consensus encoding.
    pub lock_time: u32,
    /// Coin selection rounds allowed while the fee settles. The builder raises this to one
    /// more than the number of unspent outputs, which every settling build fits in.
    pub max_fee_iterations: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            tx_version: DEFAULT_TX_VERSION,
            lock_time: 0,
            max_fee_iterations: DEFAULT_MAX_FEE_ITERATIONS,
        }
    }
}

impl BuilderConfig {
    pub fn version(&self) -> Version {
        Version(self.tx_version)
    }

    pub fn lock_time(&self) -> LockTime {
        LockTime::from_consensus(self.lock_time)
    }

    /// Always at least one round.
    pub fn fee_iterations(&self) -> usize {
        self.max_fee_iterations.max(1)
    }
}
