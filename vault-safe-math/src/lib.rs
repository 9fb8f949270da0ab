//! Checked arithmetic for amounts and serialized sizes.
//!
//! Every helper reports overflow, underflow and division by zero as a [`MathError`] instead
//! of wrapping or panicking, so callers can surface a typed error.

use num::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Zero};

use primitive_types::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Addition overflowed")]
    AdditionOverflow,
    #[error("Subtraction overflowed")]
    SubtractionOverflow,
    #[error("Multiplication overflowed")]
    MultiplicationOverflow,
    #[error("Division overflowed")]
    DivisionOverflow,
    #[error("Failed to convert a math result from U256 back to its original type")]
    ConversionError,
}

pub fn safe_add<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedAdd,
{
    a.checked_add(&b).ok_or(MathError::AdditionOverflow)
}

pub fn safe_sub<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedSub,
{
    a.checked_sub(&b).ok_or(MathError::SubtractionOverflow)
}

pub fn safe_mul<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedMul,
{
    a.checked_mul(&b).ok_or(MathError::MultiplicationOverflow)
}

pub fn safe_div<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedDiv,
{
    a.checked_div(&b).ok_or(MathError::DivisionOverflow)
}

/// Sums every item, failing on the first overflow.
pub fn safe_sum<T, I>(items: I) -> Result<T, MathError>
where
    T: CheckedAdd + Zero,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .try_fold(T::zero(), |acc, item| safe_add(acc, item))
}

/// `mul_a * mul_b / div`, rounded down. The product is computed in 256 bits.
pub fn mul_div<T>(mul_a: T, mul_b: T, div: T) -> Result<T, MathError>
where
    T: TryFrom<U256>,
    U256: From<T>,
{
    let (quotient, _) = wide_mul_div(mul_a, mul_b, div)?;

    quotient.try_into().map_err(|_| MathError::ConversionError)
}

/// `mul_a * mul_b / div`, rounded up. Used wherever truncation would underpay.
pub fn mul_div_ceil<T>(mul_a: T, mul_b: T, div: T) -> Result<T, MathError>
where
    T: TryFrom<U256>,
    U256: From<T>,
{
    let (quotient, remainder) = wide_mul_div(mul_a, mul_b, div)?;

    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or(MathError::AdditionOverflow)?
    };

    quotient.try_into().map_err(|_| MathError::ConversionError)
}

fn wide_mul_div<T>(mul_a: T, mul_b: T, div: T) -> Result<(U256, U256), MathError>
where
    U256: From<T>,
{
    let a = U256::from(mul_a);
    let b = U256::from(mul_b);
    let div = U256::from(div);

    let mul = a.checked_mul(b).ok_or(MathError::MultiplicationOverflow)?;
    let quotient = mul.checked_div(div).ok_or(MathError::DivisionOverflow)?;
    let remainder = mul.checked_rem(div).ok_or(MathError::DivisionOverflow)?;

    Ok((quotient, remainder))
}
