//! Small conversions used throughout the opcode handlers.
//!
//! Grounded in the teacher's `opcode_handlers/arithmetic.rs` and
//! `opcode_handlers/bitwise_comparison.rs`: signed values are represented
//! as ordinary `U256`s and converted on demand rather than carrying a
//! separate signed integer type end to end.

use crate::errors::{ExceptionalHalt, InternalError, VMError};
use ethereum_types::{Address, U256};

/// Interprets `value` as a two's-complement signed 256-bit integer and
/// returns whether it is negative (spec §9 `to_signed`/`to_unsigned`).
#[inline]
pub fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Two's-complement negation.
#[inline]
pub fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Absolute value under two's-complement interpretation.
#[inline]
pub fn abs(value: U256) -> U256 {
    if is_negative(value) { negate(value) } else { value }
}

/// Low 20 bytes of a stack word, used whenever an opcode reads an address
/// argument (e.g. `BALANCE`, `CALL`'s callee).
#[inline]
pub fn word_to_address(word: U256) -> Address {
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    Address::from_slice(&bytes[12..32])
}

#[inline]
pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

/// Converts a `U256` to `usize`, saturating at `usize::MAX` rather than
/// erroring: offsets this large always blow the gas budget on the
/// resulting memory-expansion cost before they could ever be used, so
/// saturating is observably identical to rejecting them outright.
#[inline]
pub fn u256_to_usize_saturating(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

/// Strict conversion used where an out-of-range value is a genuine
/// host-side bug (internal bookkeeping, never a user-controlled stack
/// value).
#[inline]
pub fn u256_to_u64(value: U256) -> Result<u64, VMError> {
    if value > U256::from(u64::MAX) {
        return Err(InternalError::TypeConversion.into());
    }
    Ok(value.low_u64())
}

/// Normalizes a `(size, offset)` stack pair into `usize`s, per the
/// convention used by `*COPY` and `CALL`-family opcodes: a zero size
/// never triggers a bounds or memory-expansion concern regardless of how
/// large `offset` is, so offset is only saturated (not validated) in
/// that case.
#[inline]
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), VMError> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    let size = if size > U256::from(isize::MAX as u64) {
        return Err(ExceptionalHalt::VeryLargeNumber.into());
    } else {
        size.as_usize()
    };
    let offset = if offset > U256::from(isize::MAX as u64) {
        return Err(ExceptionalHalt::VeryLargeNumber.into());
    } else {
        offset.as_usize()
    };
    Ok((size, offset))
}

/// Number of bytes needed to represent `value`, used by the `EXP` gas
/// formula (`byte_length(exponent)`).
#[inline]
pub fn byte_length(value: U256) -> u64 {
    let bits = 256 - value.leading_zeros();
    bits.div_ceil(8) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_and_abs_roundtrip() {
        let n = U256::from(5);
        let neg = negate(n);
        assert!(is_negative(neg));
        assert_eq!(abs(neg), n);
    }

    #[test]
    fn byte_length_zero_is_zero() {
        assert_eq!(byte_length(U256::zero()), 0);
    }

    #[test]
    fn byte_length_matches_examples() {
        assert_eq!(byte_length(U256::from(1)), 1);
        assert_eq!(byte_length(U256::from(255)), 1);
        assert_eq!(byte_length(U256::from(256)), 2);
    }

    #[test]
    fn word_address_roundtrip() {
        let addr = Address::from_low_u64_be(0xdead_beef);
        assert_eq!(word_to_address(address_to_word(addr)), addr);
    }
}
