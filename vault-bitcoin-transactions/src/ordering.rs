//! Canonical (BIP69) ordering of transaction inputs and outputs.
//!
//! Inputs are ordered by previous txid, compared in displayed byte order, then by output
//! index. Outputs are ordered by value, then by locking script bytes. Sorting must happen
//! once, after every input and output is known, and before any signature hash is computed.

use std::cmp::Ordering;

use bitcoin::{Transaction, TxIn, TxOut};

use crate::bytes::txid_to_bytes_big_endian;

pub fn compare_inputs(a: &TxIn, b: &TxIn) -> Ordering {
    txid_to_bytes_big_endian(&a.previous_output.txid)
        .cmp(&txid_to_bytes_big_endian(&b.previous_output.txid))
        .then_with(|| a.previous_output.vout.cmp(&b.previous_output.vout))
}

pub fn compare_outputs(a: &TxOut, b: &TxOut) -> Ordering {
    a.value
        .cmp(&b.value)
        .then_with(|| a.script_pubkey.as_bytes().cmp(b.script_pubkey.as_bytes()))
}

/// Sorts `transaction`'s inputs and outputs into canonical order in place.
pub fn sort_transaction(transaction: &mut Transaction) {
    transaction.input.sort_by(compare_inputs);
    transaction.output.sort_by(compare_outputs);
}

/// Whether `transaction` is already in canonical order.
pub fn is_sorted(transaction: &Transaction) -> bool {
    let inputs_sorted = transaction
        .input
        .windows(2)
        .all(|pair| compare_inputs(&pair[0], &pair[1]) != Ordering::Greater);
    let outputs_sorted = transaction
        .output
        .windows(2)
        .all(|pair| compare_outputs(&pair[0], &pair[1]) != Ordering::Greater);

    inputs_sorted && outputs_sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{
        absolute::LockTime, hashes::Hash, transaction::Version, Amount, OutPoint, ScriptBuf,
        Sequence, Txid, Witness,
    };
    use std::str::FromStr;

    fn create_mock_transaction() -> Transaction {
        Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![],
        }
    }

    fn create_mock_tx_in(outpoint: OutPoint) -> TxIn {
        TxIn {
            previous_output: outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }
    }

    fn create_mock_tx_out(value: u64, script: &[u8]) -> TxOut {
        TxOut {
            value: Amount::from_sat(value),
            script_pubkey: ScriptBuf::from_bytes(script.to_vec()),
        }
    }

    fn outpoint(txid_hex: &str, vout: u32) -> OutPoint {
        OutPoint {
            txid: Txid::from_str(txid_hex).unwrap(),
            vout,
        }
    }

    #[test]
    fn inputs_compare_txids_in_display_order() {
        // Internal byte order would put `low` second: its first internal byte is 0xff
        let mut internal = [0u8; 32];
        internal[0] = 0xff;
        let low = OutPoint {
            txid: Txid::from_byte_array(internal),
            vout: 0,
        };
        let high = outpoint(
            "0100000000000000000000000000000000000000000000000000000000000000",
            0,
        );

        let mut transaction = create_mock_transaction();
        transaction.input = vec![create_mock_tx_in(high), create_mock_tx_in(low)];
        sort_transaction(&mut transaction);

        assert_eq!(transaction.input[0].previous_output, low);
        assert_eq!(transaction.input[1].previous_output, high);
    }

    #[test]
    fn inputs_with_same_txid_sort_by_index() {
        let txid = "aa00000000000000000000000000000000000000000000000000000000000000";
        let mut transaction = create_mock_transaction();
        transaction.input = vec![
            create_mock_tx_in(outpoint(txid, 2)),
            create_mock_tx_in(outpoint(txid, 0)),
            create_mock_tx_in(outpoint(txid, 1)),
        ];

        sort_transaction(&mut transaction);

        let vouts: Vec<u32> = transaction
            .input
            .iter()
            .map(|input| input.previous_output.vout)
            .collect();
        assert_eq!(vouts, vec![0, 1, 2]);
    }

    #[test]
    fn outputs_sort_by_value_then_script() {
        let mut transaction = create_mock_transaction();
        transaction.output = vec![
            create_mock_tx_out(2_000, &[0x01]),
            create_mock_tx_out(1_000, &[0x02, 0x00]),
            create_mock_tx_out(1_000, &[0x01, 0xff]),
        ];

        sort_transaction(&mut transaction);

        assert_eq!(transaction.output[0], create_mock_tx_out(1_000, &[0x01, 0xff]));
        assert_eq!(transaction.output[1], create_mock_tx_out(1_000, &[0x02, 0x00]));
        assert_eq!(transaction.output[2], create_mock_tx_out(2_000, &[0x01]));
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut transaction = create_mock_transaction();
        transaction.input = vec![
            create_mock_tx_in(outpoint(
                "ff00000000000000000000000000000000000000000000000000000000000000",
                0,
            )),
            create_mock_tx_in(outpoint(
                "0f00000000000000000000000000000000000000000000000000000000000000",
                5,
            )),
        ];
        transaction.output = vec![create_mock_tx_out(7, &[0x51]), create_mock_tx_out(3, &[0x52])];

        assert!(!is_sorted(&transaction));
        sort_transaction(&mut transaction);
        assert!(is_sorted(&transaction));

        let sorted = transaction.clone();
        sort_transaction(&mut transaction);
        assert_eq!(transaction, sorted);
    }

    #[test]
    fn empty_and_single_entry_transactions_are_sorted() {
        let mut transaction = create_mock_transaction();
        assert!(is_sorted(&transaction));

        transaction.output.push(create_mock_tx_out(1, &[]));
        assert!(is_sorted(&transaction));
    }
}
