//! Signing orchestration.
//!
//! Private keys never enter this crate. For every input the orchestrator computes the
//! signature hash and pairs it with the keypath of the key that must sign it. The whole
//! batch goes to the [`ExternalSigner`] in one call, so a hardware device prompts the user
//! once per transaction rather than once per input.
//!
//! The unsigned transaction is never modified. Signatures are assembled into a copy, which
//! is verified before it is returned. If the signer fails or the caller stops polling the
//! future, no partially signed transaction exists.

use std::future::Future;

use async_trait::async_trait;
use bitcoin::{
    bip32::DerivationPath,
    ecdsa,
    hashes::Hash,
    secp256k1,
    sighash::SighashCache,
    EcdsaSighashType, Transaction,
};
use futures::future::{AbortHandle, Abortable};
use tracing::{debug, info, warn};

use crate::{
    address::SighashKind,
    error::{InvariantViolation, SignError, SignerError},
    ordering::is_sorted,
    utxo_info::UnspentOutput,
    verify::{verify_signatures, verify_transaction},
};

/// One signature the external signer is asked to produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureRequest {
    /// Signature hash, already computed with `SIGHASH_ALL`.
    pub sighash: [u8; 32],
    /// Derivation path of the signing key.
    pub key_path: DerivationPath,
}

/// Key custody outside this process, usually a hardware wallet.
///
/// Implementations must return exactly one signature per request, in request order. A user
/// declining on the device is [`SignerError::Rejected`]; transport problems and timeouts are
/// [`SignerError::Failed`]. Any retrying belongs to the implementation.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    async fn sign(
        &self,
        requests: &[SignatureRequest],
    ) -> Result<Vec<secp256k1::ecdsa::Signature>, SignerError>;
}

/// Computes the signature request of every input of `transaction`.
///
/// `previous_outputs[i]` must be the output spent by input `i`. Segwit inputs share one
/// [`SighashCache`], so the prevouts, sequences and outputs hashes are computed once per
/// transaction. Legacy hashes are computed per input from the unmodified transaction.
pub fn signature_requests(
    transaction: &Transaction,
    previous_outputs: &[UnspentOutput],
) -> Result<Vec<SignatureRequest>, InvariantViolation> {
    check_previous_outputs(transaction, previous_outputs)?;

    let mut cache = SighashCache::new(transaction);

    previous_outputs
        .iter()
        .enumerate()
        .map(|(index, spent)| -> Result<SignatureRequest, InvariantViolation> {
            let script = spent.owner.sighash_script();
            let sighash_error = |reason: String| InvariantViolation::Sighash { index, reason };

            let sighash = match spent.owner.sighash_kind() {
                SighashKind::Legacy => cache
                    .legacy_signature_hash(index, &script, EcdsaSighashType::All.to_u32())
                    .map_err(|e| sighash_error(e.to_string()))?
                    .to_byte_array(),
                SighashKind::SegwitV0 => cache
                    .p2wpkh_signature_hash(index, &script, spent.value, EcdsaSighashType::All)
                    .map_err(|e| sighash_error(e.to_string()))?
                    .to_byte_array(),
            };

            debug!(
                index,
                key_path = %spent.owner.key_path,
                sighash = %hex::encode(sighash),
                "computed signature hash"
            );

            Ok(SignatureRequest {
                sighash,
                key_path: spent.owner.key_path.clone(),
            })
        })
        .collect()
}

/// Signs every input of `transaction` through `signer` and returns the signed copy.
///
/// `previous_outputs` must list the output spent by each input, in input order (see
/// [`crate::builder::TxProposal::previous_outputs`]). The transaction must already be in
/// canonical order; it is signed exactly as given.
///
/// # Errors
/// * [`SignError::Rejected`] / [`SignError::Failed`] – reported by the signer, unchanged.
/// * [`SignError::Fatal`] – misaligned inputs, a wrong signature count, a signature that does
///   not verify, or a signed transaction that fails script execution.
pub async fn sign_transaction<S>(
    signer: &S,
    transaction: &Transaction,
    previous_outputs: &[UnspentOutput],
) -> Result<Transaction, SignError>
where
    S: ExternalSigner + ?Sized,
{
    if !is_sorted(transaction) {
        return Err(InvariantViolation::NonCanonicalOrder.into());
    }

    let requests = signature_requests(transaction, previous_outputs)?;

    info!(requests = requests.len(), "requesting signatures");
    let signatures = signer.sign(&requests).await.map_err(|e| {
        warn!(error = %e, "signer did not sign");
        SignError::from(e)
    })?;
    debug!(signatures = signatures.len(), "received signatures");

    if signatures.len() != requests.len() {
        return Err(InvariantViolation::SignatureCountMismatch {
            requests: requests.len(),
            signatures: signatures.len(),
        }
        .into());
    }

    let signatures: Vec<_> = signatures
        .into_iter()
        .map(|mut signature| {
            signature.normalize_s();
            signature
        })
        .collect();

    verify_signatures(&requests, &signatures, previous_outputs)?;

    let mut signed = transaction.clone();
    for (index, ((input, spent), signature)) in signed
        .input
        .iter_mut()
        .zip(previous_outputs)
        .zip(&signatures)
        .enumerate()
    {
        let (script_sig, witness) = spent
            .owner
            .unlocking_proof(&ecdsa::Signature::sighash_all(*signature))
            .map_err(|e| InvariantViolation::ScriptAssembly {
                index,
                reason: e.to_string(),
            })?;

        input.script_sig = script_sig;
        input.witness = witness;
    }

    verify_transaction(&signed, previous_outputs)?;

    info!(txid = %signed.compute_txid(), "transaction signed");

    Ok(signed)
}

/// Like [`sign_transaction`], but also returns a handle that cancels the signing batch.
///
/// Aborting resolves the future to [`SignError::Aborted`]; nothing signed is returned.
pub fn sign_transaction_abortable<'a, S>(
    signer: &'a S,
    transaction: &'a Transaction,
    previous_outputs: &'a [UnspentOutput],
) -> (
    impl Future<Output = Result<Transaction, SignError>> + 'a,
    AbortHandle,
)
where
    S: ExternalSigner + ?Sized,
{
    let (handle, registration) = AbortHandle::new_pair();
    let signing = Abortable::new(
        sign_transaction(signer, transaction, previous_outputs),
        registration,
    );

    let future = async move {
        signing.await.unwrap_or_else(|_| {
            warn!("signing aborted by caller");
            Err(SignError::Aborted)
        })
    };

    (future, handle)
}

fn check_previous_outputs(
    transaction: &Transaction,
    previous_outputs: &[UnspentOutput],
) -> Result<(), InvariantViolation> {
    if previous_outputs.len() != transaction.input.len() {
        return Err(InvariantViolation::InputOutputMismatch {
            inputs: transaction.input.len(),
            previous_outputs: previous_outputs.len(),
        });
    }

    if let Some(index) = transaction
        .input
        .iter()
        .zip(previous_outputs)
        .position(|(input, spent)| input.previous_output != spent.outpoint)
    {
        return Err(InvariantViolation::PreviousOutputMismatch { index });
    }

    Ok(())
}
