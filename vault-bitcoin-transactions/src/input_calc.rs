// Serialized sizes of the pieces of a non-witness transaction, in bytes.

// Sizes of the transaction envelope
const TX_VERSION_SIZE: usize = 4; // nVersion
const TX_LOCK_TIME_SIZE: usize = 4; // nLockTime
pub const TX_OVERHEAD_SIZE: usize = TX_VERSION_SIZE + TX_LOCK_TIME_SIZE; // 4 + 4 = 8 bytes

// Sizes of the non-witness input data
const INPUT_OUTPOINT_SIZE: usize = 36; // 32-byte txid + 4-byte vout
const INPUT_SEQUENCE_SIZE: usize = 4; // nSequence

// Worst-case DER signature including the sighash byte, and a compressed pubkey
pub const MAX_SIGNATURE_SIZE: usize = 73;
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// Signature script spending a P2PKH output: push(sig) + push(pubkey).
pub const REDEEM_P2PKH_SIG_SCRIPT_SIZE: usize =
    1 + MAX_SIGNATURE_SIZE + 1 + COMPRESSED_PUBKEY_SIZE; // 1 + 73 + 1 + 33 = 108 bytes

/// P2PKH locking script: DUP HASH160 push(20) <hash> EQUALVERIFY CHECKSIG.
pub const P2PKH_PK_SCRIPT_SIZE: usize = 1 + 1 + 1 + 20 + 1 + 1; // 25 bytes

/// Size of one input spending a P2PKH output. Segwit inputs move their signature into the
/// witness and are strictly smaller, so this is the weight charged for every input.
pub const REDEEM_P2PKH_INPUT_SIZE: usize = INPUT_OUTPOINT_SIZE
    + varint_len(REDEEM_P2PKH_SIG_SCRIPT_SIZE)
    + REDEEM_P2PKH_SIG_SCRIPT_SIZE
    + INPUT_SEQUENCE_SIZE; // 36 + 1 + 108 + 4 = 149 bytes

// Sizes of an output
const OUTPUT_VALUE_SIZE: usize = 8;

/// Size of an output paying to a P2PKH script, the shape assumed for change.
pub const P2PKH_OUTPUT_SIZE: usize =
    OUTPUT_VALUE_SIZE + varint_len(P2PKH_PK_SCRIPT_SIZE) + P2PKH_PK_SCRIPT_SIZE; // 8 + 1 + 25 = 34 bytes

/// Calculates number of bytes a varint will occupy
/// https://developer.bitcoin.org/reference/transactions.html#compactsize-unsigned-integers
pub const fn varint_len(n: usize) -> usize {
    match n {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x10000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Serialized size of an output with a locking script of `script_len` bytes.
pub const fn output_size(script_len: usize) -> usize {
    OUTPUT_VALUE_SIZE + varint_len(script_len) + script_len
}
