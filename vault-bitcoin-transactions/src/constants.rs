use crate::input_calc::P2PKH_PK_SCRIPT_SIZE;

/// Fee rates are expressed per this many bytes.
pub const BYTES_PER_KB: u64 = 1_000;

/// Size of the input that would later spend an output, as assumed by the relay dust rule.
pub const DUST_SPEND_INPUT_SIZE: usize = 148;

/// An output is dust when spending it costs more than a third of its value.
pub const DUST_FEE_MULTIPLIER: u64 = 3;

/// Largest change locking script the size estimate accounts for.
pub const MAX_CHANGE_SCRIPT_SIZE: usize = P2PKH_PK_SCRIPT_SIZE;

pub const DEFAULT_TX_VERSION: i32 = 1;

pub const DEFAULT_MAX_FEE_ITERATIONS: usize = 4;
