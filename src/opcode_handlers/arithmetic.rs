//! Arithmetic opcodes (spec §4.6), grounded in the teacher's
//! `opcode_handlers/arithmetic.rs`: signed operations convert through
//! `utils::to_signed`-equivalent helpers rather than a dedicated signed
//! integer type.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::gas;
use crate::opcodes::Opcode;
use crate::utils::{abs, is_negative, negate};
use crate::vm::VM;
use ethereum_types::{U256, U512};

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn exec_arithmetic(&mut self, opcode: Opcode) -> Result<(), VMError> {
        match opcode {
            Opcode::ADD => self.op_add(),
            Opcode::MUL => self.op_mul(),
            Opcode::SUB => self.op_sub(),
            Opcode::DIV => self.op_div(),
            Opcode::SDIV => self.op_sdiv(),
            Opcode::MOD => self.op_mod(),
            Opcode::SMOD => self.op_smod(),
            Opcode::ADDMOD => self.op_addmod(),
            Opcode::MULMOD => self.op_mulmod(),
            Opcode::EXP => self.op_exp(),
            Opcode::SIGNEXTEND => self.op_signextend(),
            _ => unreachable!("exec_arithmetic called with non-arithmetic opcode"),
        }
    }

    fn op_add(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(a.overflowing_add(b).0)
    }

    fn op_mul(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(a.overflowing_mul(b).0)
    }

    fn op_sub(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(a.overflowing_sub(b).0)
    }

    fn op_div(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        let result = if b.is_zero() { U256::zero() } else { a / b };
        self.state.stack.push(result)
    }

    fn op_sdiv(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        if b.is_zero() {
            return self.state.stack.push(U256::zero());
        }
        let (a_neg, b_neg) = (is_negative(a), is_negative(b));
        let (abs_a, abs_b) = (abs(a), abs(b));
        let quotient = abs_a / abs_b;
        let result = if a_neg != b_neg { negate(quotient) } else { quotient };
        self.state.stack.push(result)
    }

    fn op_mod(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        let result = if b.is_zero() { U256::zero() } else { a % b };
        self.state.stack.push(result)
    }

    fn op_smod(&mut self) -> Result<(), VMError> {
        let [a, b] = *self.state.stack.pop::<2>()?;
        if b.is_zero() {
            return self.state.stack.push(U256::zero());
        }
        let a_neg = is_negative(a);
        let (abs_a, abs_b) = (abs(a), abs(b));
        let remainder = abs_a % abs_b;
        let result = if a_neg { negate(remainder) } else { remainder };
        self.state.stack.push(result)
    }

    fn op_addmod(&mut self) -> Result<(), VMError> {
        let [a, b, n] = *self.state.stack.pop::<3>()?;
        let result = if n.is_zero() {
            U256::zero()
        } else {
            let a = U512::from(a);
            let b = U512::from(b);
            let n = U512::from(n);
            U256::try_from((a + b) % n).unwrap_or_default()
        };
        self.state.stack.push(result)
    }

    fn op_mulmod(&mut self) -> Result<(), VMError> {
        let [a, b, n] = *self.state.stack.pop::<3>()?;
        let result = if n.is_zero() {
            U256::zero()
        } else {
            let a = U512::from(a);
            let b = U512::from(b);
            let n = U512::from(n);
            U256::try_from(a * b % n).unwrap_or_default()
        };
        self.state.stack.push(result)
    }

    fn op_exp(&mut self) -> Result<(), VMError> {
        let [base, exponent] = *self.state.stack.pop::<2>()?;
        let cost = gas::exp_cost(exponent, &self.env.config)?;
        self.state.consume_gas(cost)?;
        self.state.stack.push(checked_pow(base, exponent))
    }

    fn op_signextend(&mut self) -> Result<(), VMError> {
        let [byte_index, value] = *self.state.stack.pop::<2>()?;
        self.state.stack.push(sign_extend(byte_index, value))
    }
}

/// Sign-extends `value`, treating it as an integer occupying `byte_index +
/// 1` bytes (low byte = index 0). A `byte_index >= 32` is a no-op.
fn sign_extend(byte_index: U256, value: U256) -> U256 {
    if byte_index >= U256::from(32) {
        return value;
    }
    let byte_index = byte_index.as_usize();
    let bit_index = byte_index.wrapping_mul(8).wrapping_add(7);
    let sign_bit = value.bit(bit_index);
    let mask = (U256::one() << bit_index).overflowing_sub(U256::one()).0;
    if sign_bit { value | !mask } else { value & mask }
}

/// `base^exponent mod 2^256`, computed via repeated squaring.
fn checked_pow(base: U256, exponent: U256) -> U256 {
    let mut result = U256::one();
    let mut base = base;
    let mut exponent = exponent;
    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        base = base.overflowing_mul(base).0;
        exponent >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_zero_exponent_is_one() {
        assert_eq!(checked_pow(U256::from(5), U256::zero()), U256::one());
    }

    #[test]
    fn exp_wraps_on_overflow() {
        let result = checked_pow(U256::from(2), U256::from(256));
        assert_eq!(result, U256::zero());
    }

    #[test]
    fn signextend_no_op_past_31() {
        let value = U256::from(0xff);
        assert_eq!(sign_extend(U256::from(32), value), value);
    }

    #[test]
    fn signextend_negative_byte_fills_high_bits() {
        // 0xff in byte 0, sign-extended to a full negative U256.
        let value = U256::from(0xffu64);
        let extended = sign_extend(U256::zero(), value);
        assert_eq!(extended, U256::MAX);
    }

    #[test]
    fn signextend_positive_byte_zero_fills() {
        let value = U256::from(0x7fu64);
        let extended = sign_extend(U256::zero(), value);
        assert_eq!(extended, value);
    }
}
