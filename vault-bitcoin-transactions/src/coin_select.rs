use std::cmp::Ordering;

use bitcoin::{Amount, OutPoint};
use tracing::debug;
use vault_safe_math::safe_add;

use crate::{
    error::BuildError,
    utxo_info::{total_value, UnspentOutput, UtxoSet},
};

/// Outputs picked to fund a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinSelection {
    /// Selected outpoints, largest value first.
    pub outpoints: Vec<OutPoint>,
    pub total: Amount,
}

impl CoinSelection {
    pub fn len(&self) -> usize {
        self.outpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outpoints.is_empty()
    }
}

/// Selects outputs from `utxos` whose total covers `target`.
///
/// Outputs are taken largest first until the running sum reaches `target`, which keeps the
/// input count (and so the fee) low when a few large outputs dominate. It is not a
/// fee-optimal search. Outputs of equal value are taken in ascending outpoint order so the
/// result does not depend on map iteration order.
///
/// # Errors
/// * [`BuildError::InsufficientFunds`] – all of `utxos` together are worth less than `target`.
pub fn select_coins(target: Amount, utxos: &UtxoSet) -> Result<CoinSelection, BuildError> {
    let mut candidates: Vec<&UnspentOutput> = utxos.values().collect();
    candidates.sort_by(|a, b| by_value_descending(a, b));

    let mut total = Amount::ZERO;
    let mut outpoints = Vec::new();

    for utxo in candidates {
        if total >= target {
            break;
        }

        total = Amount::from_sat(safe_add(total.to_sat(), utxo.value.to_sat())?);
        outpoints.push(utxo.outpoint);
    }

    if total < target {
        return Err(BuildError::InsufficientFunds {
            needed: target,
            available: total_value(utxos.values())?,
        });
    }

    debug!(
        %target,
        %total,
        selected = outpoints.len(),
        available = utxos.len(),
        "selected coins"
    );

    Ok(CoinSelection { outpoints, total })
}

fn by_value_descending(a: &UnspentOutput, b: &UnspentOutput) -> Ordering {
    b.value
        .cmp(&a.value)
        .then_with(|| a.outpoint.cmp(&b.outpoint))
}
