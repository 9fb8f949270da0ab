use std::collections::HashMap;

use bitcoin::{Amount, OutPoint, ScriptBuf, TxOut};
use vault_safe_math::{safe_sum, MathError};

use crate::address::AddressInfo;

/// A spendable output controlled by the wallet.
///
/// Owned by the ledger tracker that feeds the builder; the builder and the signer only
/// read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    pub outpoint: OutPoint,
    pub value: Amount,
    pub script_pubkey: ScriptBuf,
    pub owner: AddressInfo,
}

impl UnspentOutput {
    /// Creates an output locked to `owner`'s own script.
    pub fn new(outpoint: OutPoint, value: Amount, owner: AddressInfo) -> Self {
        Self {
            outpoint,
            value,
            script_pubkey: owner.script_pubkey(),
            owner,
        }
    }

    pub fn tx_out(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

/// Snapshot of the wallet's spendable outputs, keyed by outpoint.
pub type UtxoSet = HashMap<OutPoint, UnspentOutput>;

/// Builds a [`UtxoSet`] from a list of outputs.
pub fn utxo_set<I>(outputs: I) -> UtxoSet
where
    I: IntoIterator<Item = UnspentOutput>,
{
    outputs
        .into_iter()
        .map(|output| (output.outpoint, output))
        .collect()
}

/// Sum of the values of `outputs`.
pub fn total_value<'a, I>(outputs: I) -> Result<Amount, MathError>
where
    I: IntoIterator<Item = &'a UnspentOutput>,
{
    let total = safe_sum(outputs.into_iter().map(|output| output.value.to_sat()))?;

    Ok(Amount::from_sat(total))
}

/// Looks up the outputs spent by `outpoints`, preserving their order.
///
/// Returns the first outpoint missing from `utxos` on failure.
pub fn previous_outputs(
    utxos: &UtxoSet,
    outpoints: &[OutPoint],
) -> Result<Vec<UnspentOutput>, OutPoint> {
    outpoints
        .iter()
        .map(|outpoint| utxos.get(outpoint).cloned().ok_or(*outpoint))
        .collect()
}
