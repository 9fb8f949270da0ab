use bitcoin::{Amount, OutPoint};
use thiserror::Error;
use vault_safe_math::MathError;

/// Broken contract between the builder, the signer and the verifier.
///
/// These never describe a condition the user can fix. Callers should report them and must
/// not retry the operation automatically.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("There needs to be exactly one previous output per input: {inputs} inputs, {previous_outputs} previous outputs")]
    InputOutputMismatch {
        inputs: usize,
        previous_outputs: usize,
    },

    #[error("The previous output at position {index} does not match the outpoint spent by that input")]
    PreviousOutputMismatch { index: usize },

    #[error("The spent output {outpoint} is not part of the wallet's unspent outputs")]
    MissingPreviousOutput { outpoint: OutPoint },

    #[error("The signer returned {signatures} signatures for {requests} requests")]
    SignatureCountMismatch { requests: usize, signatures: usize },

    #[error("The transaction inputs or outputs are not in canonical order")]
    NonCanonicalOrder,

    #[error("Failed to compute the signature hash of input {index}: {reason}")]
    Sighash { index: usize, reason: String },

    #[error("Failed to assemble the spend proof of input {index}: {reason}")]
    ScriptAssembly { index: usize, reason: String },

    #[error("The signature for input {index} does not match its signature hash and key")]
    SignatureMismatch { index: usize },

    #[error("Input {index} failed script verification: {reason}")]
    ScriptVerification { index: usize, reason: String },

    #[error("The fee did not converge after {iterations} coin selection rounds")]
    FeeDidNotConverge { iterations: usize },
}

/// Errors raised while constructing an unsigned transaction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Insufficient funds: {needed} needed, {available} available")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("Insufficient funds for fee: {fee} fee, {available} available")]
    InsufficientFundsForFee { fee: Amount, available: Amount },

    #[error("Fee estimation requires change scripts no larger than {max} bytes, got {len}")]
    ChangeScriptTooLarge { len: usize, max: usize },

    #[error("Failed to get a change address")]
    ChangeAddress(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("An arithmetic error ocurred")]
    CalcOverflow,

    #[error(transparent)]
    Fatal(#[from] InvariantViolation),
}

impl BuildError {
    /// `true` when the error is a bug rather than a condition the user can resolve.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildError::Fatal(_))
    }
}

/// What an [`crate::signing::ExternalSigner`] reports when it cannot produce signatures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Signing was rejected: {0}")]
    Rejected(String),

    #[error("Signing failed: {0}")]
    Failed(String),
}

/// Errors raised while signing an unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("Signing was rejected: {0}")]
    Rejected(String),

    #[error("Signing failed: {0}")]
    Failed(String),

    #[error("Signing was aborted")]
    Aborted,

    #[error(transparent)]
    Fatal(#[from] InvariantViolation),
}

impl SignError {
    /// `true` when the error is a bug rather than a signer-side refusal or failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignError::Fatal(_))
    }
}

// === Conversions ============================================================

impl From<MathError> for BuildError {
    fn from(error: MathError) -> Self {
        match error {
            MathError::AdditionOverflow
            | MathError::SubtractionOverflow
            | MathError::MultiplicationOverflow
            | MathError::DivisionOverflow
            | MathError::ConversionError => BuildError::CalcOverflow,
        }
    }
}

impl From<SignerError> for SignError {
    fn from(error: SignerError) -> Self {
        match error {
            SignerError::Rejected(reason) => SignError::Rejected(reason),
            SignerError::Failed(reason) => SignError::Failed(reason),
        }
    }
}
