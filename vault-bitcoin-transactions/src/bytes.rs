use bitcoin::{hashes::Hash, Txid};

/// Convert a Txid to a 32-byte array in big-endian (display) order.
///
/// Bitcoin keeps txids little-endian internally but shows them reversed, and
/// canonical input ordering compares them in the displayed order. `Txid`'s own `Ord`
/// compares the internal order, so sorting on it directly would be wrong.
///
/// **Example:** "c5cc9251192330191366016c8dab0f67dc345bd024a206c313dbf26db0a66bb1"
/// becomes bytes that match the hex string left to right.
pub fn txid_to_bytes_big_endian(txid: &Txid) -> [u8; 32] {
    let mut bytes = txid.to_byte_array();
    bytes.reverse();
    bytes
}
