//! Post-signing checks.
//!
//! Nothing here is a user-facing failure: a signed transaction that does not pass means the
//! builder and the signer disagree, so every check reports an [`InvariantViolation`].

use bitcoin::{
    consensus::encode::serialize,
    secp256k1::{self, Message, Secp256k1},
    Transaction,
};
use tracing::{debug, error};

use crate::{
    error::InvariantViolation, ordering::is_sorted, signing::SignatureRequest,
    utxo_info::UnspentOutput,
};

/// Checks every signature returned by the signer against the signature hash it was asked to
/// sign and the public key of the address owning the spent output.
pub fn verify_signatures(
    requests: &[SignatureRequest],
    signatures: &[secp256k1::ecdsa::Signature],
    previous_outputs: &[UnspentOutput],
) -> Result<(), InvariantViolation> {
    if signatures.len() != requests.len() {
        return Err(InvariantViolation::SignatureCountMismatch {
            requests: requests.len(),
            signatures: signatures.len(),
        });
    }
    if previous_outputs.len() != requests.len() {
        return Err(InvariantViolation::InputOutputMismatch {
            inputs: requests.len(),
            previous_outputs: previous_outputs.len(),
        });
    }

    let secp = Secp256k1::verification_only();

    for (index, ((request, signature), spent)) in requests
        .iter()
        .zip(signatures)
        .zip(previous_outputs)
        .enumerate()
    {
        let message = Message::from_digest(request.sighash);
        if secp
            .verify_ecdsa(&message, signature, &spent.owner.public_key.0)
            .is_err()
        {
            error!(index, key_path = %request.key_path, "signature does not match signature hash");
            return Err(InvariantViolation::SignatureMismatch { index });
        }
    }

    Ok(())
}

/// Replays every input of the signed `transaction` against the locking script of the output
/// it spends, and checks the canonical ordering survived signing.
pub fn verify_transaction(
    transaction: &Transaction,
    previous_outputs: &[UnspentOutput],
) -> Result<(), InvariantViolation> {
    if previous_outputs.len() != transaction.input.len() {
        return Err(InvariantViolation::InputOutputMismatch {
            inputs: transaction.input.len(),
            previous_outputs: previous_outputs.len(),
        });
    }
    if !is_sorted(transaction) {
        return Err(InvariantViolation::NonCanonicalOrder);
    }

    let serialized = serialize(transaction);

    for (index, (input, spent)) in transaction.input.iter().zip(previous_outputs).enumerate() {
        if input.previous_output != spent.outpoint {
            return Err(InvariantViolation::PreviousOutputMismatch { index });
        }

        spent
            .script_pubkey
            .verify(index, spent.value, &serialized)
            .map_err(|e| {
                error!(index, error = %e, "input failed script verification");
                InvariantViolation::ScriptVerification {
                    index,
                    reason: e.to_string(),
                }
            })?;
    }

    debug!(
        txid = %transaction.compute_txid(),
        inputs = transaction.input.len(),
        "signed transaction verified"
    );

    Ok(())
}
