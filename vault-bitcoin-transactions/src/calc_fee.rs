use bitcoin::{Amount, TxOut};
use vault_safe_math::{mul_div, safe_add, safe_mul, safe_sum, MathError};

use crate::{
    constants::{BYTES_PER_KB, DUST_FEE_MULTIPLIER, DUST_SPEND_INPUT_SIZE},
    fee_rate::FeeRate,
    input_calc::{
        output_size, varint_len, P2PKH_OUTPUT_SIZE, REDEEM_P2PKH_INPUT_SIZE, TX_OVERHEAD_SIZE,
    },
};

/// Worst-case serialized size of a transaction with `input_count` wallet inputs, the given
/// `outputs`, and optionally one extra P2PKH-sized change output.
pub fn estimate_size(
    input_count: usize,
    outputs: &[TxOut],
    has_change: bool,
) -> Result<usize, MathError> {
    let (output_count, change_size) = if has_change {
        (safe_add(outputs.len(), 1)?, P2PKH_OUTPUT_SIZE)
    } else {
        (outputs.len(), 0)
    };

    let outputs_size = safe_sum(
        outputs
            .iter()
            .map(|output| output_size(output.script_pubkey.len())),
    )?;

    safe_sum([
        TX_OVERHEAD_SIZE,
        varint_len(input_count),
        varint_len(output_count),
        safe_mul(input_count, REDEEM_P2PKH_INPUT_SIZE)?,
        outputs_size,
        change_size,
    ])
}

/// Whether an output of `amount` paying to a `script_size`-byte script is dust at the given
/// relay fee rate, i.e. whether spending it would cost more than a third of its value.
pub fn is_dust_amount(
    amount: Amount,
    script_size: usize,
    fee_rate: &FeeRate,
) -> Result<bool, MathError> {
    let spend_size = safe_sum([
        output_size(script_size),
        DUST_SPEND_INPUT_SIZE,
    ])?;
    let spend_size = u64::try_from(spend_size).map_err(|_| MathError::ConversionError)?;

    let value_per_kb = mul_div(
        amount.to_sat(),
        BYTES_PER_KB,
        safe_mul(DUST_FEE_MULTIPLIER, spend_size)?,
    )?;

    Ok(value_per_kb < fee_rate.to_sat_per_kb())
}
