//! Comparison and bitwise opcodes (spec §4.6), grounded in the teacher's
//! `opcode_handlers/bitwise_comparison.rs`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::opcodes::Opcode;
use crate::utils::is_negative;
use crate::vm::VM;
use ethereum_types::U256;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn exec_bitwise_comparison(&mut self, opcode: Opcode) -> Result<(), VMError> {
        match opcode {
            Opcode::LT => self.cmp(|a, b| a < b),
            Opcode::GT => self.cmp(|a, b| a > b),
            Opcode::SLT => self.signed_cmp(|a, b| a < b),
            Opcode::SGT => self.signed_cmp(|a, b| a > b),
            Opcode::EQ => self.cmp(|a, b| a == b),
            Opcode::ISZERO => self.op_iszero(),
            Opcode::AND => self.binop(|a, b| a & b),
            Opcode::OR => self.binop(|a, b| a | b),
            Opcode::XOR => self.binop(|a, b| a ^ b),
            Opcode::NOT => self.op_not(),
            Opcode::BYTE => self.op_byte(),
            Opcode::SHL => self.op_shl(),
            Opcode::SHR => self.op_shr(),
            Opcode::SAR => self.op_sar(),
            _ => unreachable!("exec_bitwise_comparison called with non-matching opcode"),
        }
    }

    fn cmp(&mut self, f: impl Fn(U256, U256) -> bool) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(bool_to_word(f(a, b)))
    }

    fn signed_cmp(&mut self, f: impl Fn(SignedWord, SignedWord) -> bool) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(bool_to_word(f(SignedWord(a), SignedWord(b))))
    }

    fn binop(&mut self, f: impl Fn(U256, U256) -> U256) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(f(a, b))
    }

    fn op_iszero(&mut self) -> Result<(), VMError> {
        let value = self.state.stack.pop1()?;
        self.state.stack.push(bool_to_word(value.is_zero()))
    }

    fn op_not(&mut self) -> Result<(), VMError> {
        let value = self.state.stack.pop1()?;
        self.state.stack.push(!value)
    }

    fn op_byte(&mut self) -> Result<(), VMError> {
        let [index, value] = *self.state.stack.pop::<2>()?;
        let result = if index >= U256::from(32) {
            U256::zero()
        } else {
            let index = index.as_usize();
            let mut bytes = [0u8; 32];
            value.to_big_endian(&mut bytes);
            #[expect(clippy::indexing_slicing, reason = "index bound checked above")]
            U256::from(bytes[index])
        };
        self.state.stack.push(result)
    }

    fn op_shl(&mut self) -> Result<(), VMError> {
        let [shift, value] = *self.state.stack.pop::<2>()?;
        let result = if shift >= U256::from(256) { U256::zero() } else { value << shift };
        self.state.stack.push(result)
    }

    fn op_shr(&mut self) -> Result<(), VMError> {
        let [shift, value] = *self.state.stack.pop::<2>()?;
        let result = if shift >= U256::from(256) { U256::zero() } else { value >> shift };
        self.state.stack.push(result)
    }

    fn op_sar(&mut self) -> Result<(), VMError> {
        let [shift, value] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(arithmetic_shift_right(shift, value))
    }
}

fn bool_to_word(value: bool) -> U256 {
    if value { U256::one() } else { U256::zero() }
}

/// `SAR`: shift right preserving the sign bit (spec §4.6). `U256` has no
/// native arithmetic shift, so a negative operand fills the vacated high
/// bits with ones instead of zeros.
fn arithmetic_shift_right(shift: U256, value: U256) -> U256 {
    if shift.is_zero() {
        return value;
    }
    if shift >= U256::from(256) {
        return if is_negative(value) { U256::MAX } else { U256::zero() };
    }
    let shift = shift.as_usize();
    let shifted = value >> shift;
    if is_negative(value) {
        let fill = U256::MAX << 256usize.wrapping_sub(shift);
        shifted | fill
    } else {
        shifted
    }
}

/// Wraps a `U256` for two's-complement ordering comparisons (`SLT`/`SGT`).
#[derive(Clone, Copy)]
struct SignedWord(U256);

impl PartialEq for SignedWord {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for SignedWord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let (a_neg, b_neg) = (is_negative(self.0), is_negative(other.0));
        let ordering = match (a_neg, b_neg) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.0.cmp(&other.0),
        };
        Some(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_word_orders_negative_below_positive() {
        let neg = SignedWord(U256::MAX); // -1
        let pos = SignedWord(U256::one());
        assert!(neg < pos);
        assert!(pos > neg);
    }

    #[test]
    fn bool_to_word_roundtrip() {
        assert_eq!(bool_to_word(true), U256::one());
        assert_eq!(bool_to_word(false), U256::zero());
    }

    #[test]
    fn sar_negative_one_stays_negative_one() {
        let result = arithmetic_shift_right(U256::from(1), U256::MAX);
        assert_eq!(result, U256::MAX);
    }

    #[test]
    fn sar_positive_value_zero_fills() {
        let result = arithmetic_shift_right(U256::from(1), U256::from(4));
        assert_eq!(result, U256::from(2));
    }

    #[test]
    fn sar_shift_of_zero_is_identity() {
        assert_eq!(arithmetic_shift_right(U256::zero(), U256::from(42)), U256::from(42));
    }
}
