//! Bitcoin wallet transaction construction and signing.
//!
//! This crate turns a wallet's unspent outputs into a canonically ordered, fee-paying
//! transaction and signs it through an external key holder such as a hardware wallet.
//! Private keys never enter the process.
//!
//! ## Key Features
//!
//! - **Coin selection**: largest-first selection with a deterministic tie-break
//! - **Fee estimation**: worst-case size estimate and a per-kB fee rate, iterated until the
//!   selected coins pay for themselves
//! - **Dust handling**: change below the relay dust threshold is folded into the fee
//! - **Canonical ordering**: inputs and outputs are sorted per BIP69 before signing
//! - **Batch signing**: one request per input, one round trip to the signer
//! - **Verification**: every signature and every input script is checked before a signed
//!   transaction is returned
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vault_bitcoin_transactions::{
//!     sign_transaction, ExternalSigner, FeeRate, TransactionBuilder, UtxoSet,
//! };
//! use bitcoin::{ScriptBuf, TxOut};
//!
//! # async fn example(
//! #     signer: &dyn ExternalSigner,
//! #     utxos: UtxoSet,
//! #     payment: TxOut,
//! #     change: ScriptBuf,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let builder = TransactionBuilder::new();
//! let fee_rate = FeeRate::from_sat_per_kb(1_000);
//!
//! let proposal = builder.build_payment(&utxos, payment, &fee_rate, || {
//!     Ok::<_, std::convert::Infallible>(change)
//! })?;
//! let previous_outputs = proposal.previous_outputs(&utxos)?;
//!
//! let signed = sign_transaction(signer, &proposal.transaction, &previous_outputs).await?;
//! # let _ = signed;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Building fails with a [`BuildError`] and signing with a [`SignError`]. Both separate
//! conditions the user can act on (insufficient funds, a declined signature) from broken
//! internal contracts, which are wrapped in [`InvariantViolation`] and flagged by
//! `is_fatal()`.

pub mod address;
pub mod builder;
pub mod bytes;
pub mod calc_fee;
pub mod coin_select;
pub mod config;
pub mod constants;
pub mod error;
pub mod fee_rate;
pub mod input_calc;
pub mod ordering;
pub mod signing;
pub mod utxo_info;
pub mod verify;

pub use address::{AddressInfo, ScriptType, SighashKind};
pub use builder::{TransactionBuilder, TxProposal};
pub use coin_select::{select_coins, CoinSelection};
pub use config::BuilderConfig;
pub use error::{BuildError, InvariantViolation, SignError, SignerError};
pub use fee_rate::FeeRate;
pub use ordering::{is_sorted, sort_transaction};
pub use signing::{
    sign_transaction, sign_transaction_abortable, signature_requests, ExternalSigner,
    SignatureRequest,
};
pub use utxo_info::{UnspentOutput, UtxoSet};
