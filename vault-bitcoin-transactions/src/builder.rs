//! Unsigned transaction construction.
//!
//! The [`TransactionBuilder`] turns a snapshot of the wallet's unspent outputs and a desired
//! payment into a canonically ordered, unsigned [`Transaction`], ready to be handed to
//! [`crate::signing::sign_transaction`].
//!
//! ## Fee handling
//!
//! Fees are estimated from the serialized size the transaction will have once signed,
//! assuming every input is as large as a P2PKH spend and every change output as large as a
//! P2PKH output. Because the fee depends on how many inputs are selected and the selection
//! depends on the fee, [`TransactionBuilder::build_payment`] iterates until the selected
//! inputs cover both the payment and the fee their own count implies.
//!
//! ## Change
//!
//! Left-over value becomes a change output only when it is not dust at the given fee rate.
//! Otherwise it is added to the fee.

use std::error::Error;

use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::{debug, info};
use vault_safe_math::{safe_add, safe_sub, safe_sum};

use crate::{
    calc_fee::{estimate_size, is_dust_amount},
    coin_select::{select_coins, CoinSelection},
    config::BuilderConfig,
    constants::MAX_CHANGE_SCRIPT_SIZE,
    error::{BuildError, InvariantViolation},
    fee_rate::FeeRate,
    input_calc::P2PKH_PK_SCRIPT_SIZE,
    ordering::sort_transaction,
    utxo_info::{previous_outputs, total_value, UnspentOutput, UtxoSet},
};

/// An unsigned transaction together with what it spends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxProposal {
    /// Canonically ordered transaction with empty script sigs and witnesses.
    pub transaction: Transaction,
    /// Outpoints spent by the transaction, in input order.
    pub selected_outpoints: Vec<OutPoint>,
    /// Value sent to the payment (or sweep) destination.
    pub amount: Amount,
    /// Inputs minus outputs, including any change absorbed as dust.
    pub fee: Amount,
    /// Index of the change output, if one was added.
    pub change_index: Option<usize>,
}

impl TxProposal {
    pub fn change_output(&self) -> Option<&TxOut> {
        self.change_index
            .and_then(|index| self.transaction.output.get(index))
    }

    /// The outputs spent by each input, aligned with the transaction's input order.
    ///
    /// This is the `previous_outputs` argument expected by
    /// [`crate::signing::sign_transaction`].
    pub fn previous_outputs(&self, utxos: &UtxoSet) -> Result<Vec<UnspentOutput>, BuildError> {
        previous_outputs(utxos, &self.selected_outpoints)
            .map_err(|outpoint| InvariantViolation::MissingPreviousOutput { outpoint }.into())
    }
}

/// Builds unsigned transactions from a wallet's unspent outputs.
///
/// The builder holds no state besides its configuration and never mutates the outputs it is
/// given, so one instance can serve concurrent builds over independent snapshots.
#[derive(Clone, Debug, Default)]
pub struct TransactionBuilder {
    config: BuilderConfig,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Spends **every** output in `utxos` to a single output paying `output_script`.
    ///
    /// The fee follows from the fixed shape (all inputs, one output, no change) and is
    /// subtracted from the total.
    ///
    /// # Errors
    /// * [`BuildError::InsufficientFunds`] – `utxos` is empty.
    /// * [`BuildError::InsufficientFundsForFee`] – the total cannot pay the fee.
    pub fn build_spend_all(
        &self,
        utxos: &UtxoSet,
        output_script: ScriptBuf,
        fee_rate: &FeeRate,
    ) -> Result<TxProposal, BuildError> {
        let draft_output = TxOut {
            value: Amount::ZERO,
            script_pubkey: output_script,
        };
        let size = estimate_size(utxos.len(), std::slice::from_ref(&draft_output), false)?;
        let fee = fee_rate.fee_for_size(size)?;

        let available = total_value(utxos.values())?;
        if utxos.is_empty() {
            return Err(BuildError::InsufficientFunds {
                needed: fee,
                available,
            });
        }
        if available < fee {
            return Err(BuildError::InsufficientFundsForFee { fee, available });
        }

        let amount = Amount::from_sat(safe_sub(available.to_sat(), fee.to_sat())?);
        let output = TxOut {
            value: amount,
            script_pubkey: draft_output.script_pubkey,
        };

        let outpoints: Vec<OutPoint> = utxos.keys().copied().collect();
        let transaction = self.assemble(&outpoints, vec![output]);

        info!(
            inputs = outpoints.len(),
            %amount,
            %fee,
            %fee_rate,
            "built sweep transaction"
        );

        self.proposal(transaction, available, amount, None)
    }

    /// Pays `payment` from a subset of `utxos`, adding change when it is worth keeping.
    ///
    /// `change_script` is called at most once, and only when a change output is needed. Its
    /// script must not be larger than a P2PKH script, since the fee estimate assumed one.
    ///
    /// # Errors
    /// * [`BuildError::InsufficientFunds`] – `utxos` cannot cover the payment plus fee.
    /// * [`BuildError::ChangeAddress`] – `change_script` failed.
    /// * [`BuildError::ChangeScriptTooLarge`] – `change_script` returned an oversized script.
    /// * [`BuildError::Fatal`] – the fee did not settle, which means the selection loop is broken.
    pub fn build_payment<F, E>(
        &self,
        utxos: &UtxoSet,
        payment: TxOut,
        fee_rate: &FeeRate,
        change_script: F,
    ) -> Result<TxProposal, BuildError>
    where
        F: FnOnce() -> Result<ScriptBuf, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let target_amount = payment.value;
        let (selection, required_fee) = self.select_with_fee(utxos, &payment, fee_rate)?;

        let excess = safe_sub(selection.total.to_sat(), target_amount.to_sat())?;
        let change_amount = Amount::from_sat(safe_sub(excess, required_fee.to_sat())?);

        let mut outputs = vec![payment];
        let mut change = None;

        if change_amount > Amount::ZERO
            && !is_dust_amount(change_amount, P2PKH_PK_SCRIPT_SIZE, fee_rate)?
        {
            let script_pubkey = change_script().map_err(|e| BuildError::ChangeAddress(e.into()))?;
            if script_pubkey.len() > MAX_CHANGE_SCRIPT_SIZE {
                return Err(BuildError::ChangeScriptTooLarge {
                    len: script_pubkey.len(),
                    max: MAX_CHANGE_SCRIPT_SIZE,
                });
            }

            let change_output = TxOut {
                value: change_amount,
                script_pubkey,
            };
            change = Some(change_output.clone());
            outputs.push(change_output);
        } else {
            debug!(%change_amount, "change is dust, adding it to the fee");
        }

        let transaction = self.assemble(&selection.outpoints, outputs);

        info!(
            inputs = selection.len(),
            amount = %target_amount,
            change = %change.as_ref().map_or(Amount::ZERO, |output| output.value),
            %fee_rate,
            "built payment transaction"
        );

        self.proposal(transaction, selection.total, target_amount, change)
    }

    /// Repeats coin selection until the selected inputs pay for the fee their own count
    /// implies. Returns the selection and that fee.
    ///
    /// Runs at most one round per unspent output plus one, or the configured number of rounds
    /// if that is larger.
    fn select_with_fee(
        &self,
        utxos: &UtxoSet,
        payment: &TxOut,
        fee_rate: &FeeRate,
    ) -> Result<(CoinSelection, Amount), BuildError> {
        let outputs = std::slice::from_ref(payment);
        let target_amount = payment.value.to_sat();

        let mut target_fee = fee_rate.fee_for_size(estimate_size(1, outputs, true)?)?;
        // A round that does not settle asks for more than its own selection holds, so the
        // next one spends a strictly longer prefix or runs out of funds
        let iterations = self.config.fee_iterations().max(safe_add(utxos.len(), 1)?);

        for iteration in 1..=iterations {
            // A transaction needs at least one input even when nothing is owed
            let needed = safe_add(target_amount, target_fee.to_sat())?.max(1);
            let selection = select_coins(Amount::from_sat(needed), utxos)?;

            let required_fee =
                fee_rate.fee_for_size(estimate_size(selection.len(), outputs, true)?)?;
            let excess = safe_sub(selection.total.to_sat(), target_amount)?;

            if excess >= required_fee.to_sat() {
                debug!(iteration, inputs = selection.len(), fee = %required_fee, "fee settled");
                return Ok((selection, required_fee));
            }

            debug!(
                iteration,
                inputs = selection.len(),
                %target_fee,
                %required_fee,
                "selected inputs do not cover their own fee, selecting again"
            );
            target_fee = required_fee;
        }

        Err(InvariantViolation::FeeDidNotConverge { iterations }.into())
    }

    fn assemble(&self, outpoints: &[OutPoint], outputs: Vec<TxOut>) -> Transaction {
        let input = outpoints
            .iter()
            .map(|outpoint| TxIn {
                previous_output: *outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect();

        let mut transaction = Transaction {
            version: self.config.version(),
            lock_time: self.config.lock_time(),
            input,
            output: outputs,
        };
        sort_transaction(&mut transaction);

        transaction
    }

    fn proposal(
        &self,
        transaction: Transaction,
        input_value: Amount,
        amount: Amount,
        change: Option<TxOut>,
    ) -> Result<TxProposal, BuildError> {
        let output_value = safe_sum(
            transaction
                .output
                .iter()
                .map(|output| output.value.to_sat()),
        )?;
        let fee = Amount::from_sat(safe_sub(input_value.to_sat(), output_value)?);

        let change_index = change.and_then(|change| {
            transaction
                .output
                .iter()
                .position(|output| *output == change)
        });
        let selected_outpoints = transaction
            .input
            .iter()
            .map(|input| input.previous_output)
            .collect();

        Ok(TxProposal {
            transaction,
            selected_outpoints,
            amount,
            fee,
            change_index,
        })
    }
}
