//! Environment/account-introspection opcodes (spec §4.6), grounded in the
//! teacher's `opcode_handlers/environment.rs`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::gas;
use crate::memory::Memory;
use crate::opcodes::Opcode;
use crate::utils::{address_to_word, size_offset_to_usize, u256_to_usize_saturating, word_to_address};
use crate::vm::VM;
use ethereum_types::U256;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn exec_environment(&mut self, opcode: Opcode) -> Result<(), VMError> {
        match opcode {
            Opcode::ADDRESS => self.state.stack.push(address_to_word(self.env.address)),
            Opcode::BALANCE => self.op_balance(),
            Opcode::ORIGIN => self.state.stack.push(address_to_word(self.env.origin)),
            Opcode::CALLER => self.state.stack.push(address_to_word(self.env.caller)),
            Opcode::CALLVALUE => self.state.stack.push(self.env.value_in_wei),
            Opcode::CALLDATALOAD => self.op_calldataload(),
            Opcode::CALLDATASIZE => self.state.stack.push(U256::from(self.env.input_data.len())),
            Opcode::CALLDATACOPY => self.op_calldatacopy(),
            Opcode::CODESIZE => self.state.stack.push(U256::from(self.env.code.len())),
            Opcode::CODECOPY => self.op_codecopy(),
            Opcode::GASPRICE => self.state.stack.push(self.env.gas_price),
            Opcode::EXTCODESIZE => self.op_extcodesize(),
            Opcode::EXTCODECOPY => self.op_extcodecopy(),
            Opcode::RETURNDATASIZE => {
                self.state.stack.push(U256::from(self.state.last_return_data.len()))
            }
            Opcode::RETURNDATACOPY => self.op_returndatacopy(),
            Opcode::EXTCODEHASH => self.op_extcodehash(),
            _ => unreachable!("exec_environment called with non-matching opcode"),
        }
    }

    fn op_balance(&mut self) -> Result<(), VMError> {
        let address = word_to_address(self.state.stack.pop1()?);
        self.state.stack.push(self.account_view.get_balance(address))
    }

    fn op_calldataload(&mut self) -> Result<(), VMError> {
        let offset = u256_to_usize_saturating(self.state.stack.pop1()?);
        let word = Memory::read_zeroed(&self.env.input_data, offset, 32);
        self.state.stack.push(U256::from_big_endian(&word))
    }

    fn op_calldatacopy(&mut self) -> Result<(), VMError> {
        let [dest_offset, source_offset, size] = *self.state.stack.pop::<3>()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let source_offset = u256_to_usize_saturating(source_offset);
        self.state.consume_gas(gas::copy_cost(size)?)?;
        self.charge_memory_expansion(dest_offset, size)?;
        let data = Memory::read_zeroed(&self.env.input_data, source_offset, size);
        self.state.memory.write_zero_padded(dest_offset, &data, size)
    }

    fn op_codecopy(&mut self) -> Result<(), VMError> {
        let [dest_offset, source_offset, size] = *self.state.stack.pop::<3>()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let source_offset = u256_to_usize_saturating(source_offset);
        self.state.consume_gas(gas::copy_cost(size)?)?;
        self.charge_memory_expansion(dest_offset, size)?;
        let data = Memory::read_zeroed(&self.env.code, source_offset, size);
        self.state.memory.write_zero_padded(dest_offset, &data, size)
    }

    fn op_extcodesize(&mut self) -> Result<(), VMError> {
        let address = word_to_address(self.state.stack.pop1()?);
        self.state.stack.push(U256::from(self.account_view.get_code(address).len()))
    }

    fn op_extcodecopy(&mut self) -> Result<(), VMError> {
        let [address, dest_offset, source_offset, size] = *self.state.stack.pop::<4>()?;
        let address = word_to_address(address);
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let source_offset = u256_to_usize_saturating(source_offset);
        self.state.consume_gas(gas::extcodecopy_cost(size, &self.env.config)?)?;
        self.charge_memory_expansion(dest_offset, size)?;
        let code = self.account_view.get_code(address);
        let data = Memory::read_zeroed(&code, source_offset, size);
        self.state.memory.write_zero_padded(dest_offset, &data, size)
    }

    fn op_returndatacopy(&mut self) -> Result<(), VMError> {
        let [dest_offset, source_offset, size] = *self.state.stack.pop::<3>()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let source_offset = u256_to_usize_saturating(source_offset);
        let available = self.state.last_return_data.len();
        if source_offset.saturating_add(size) > available {
            return Err(crate::errors::ExceptionalHalt::OutOfBounds.into());
        }
        self.state.consume_gas(gas::copy_cost(size)?)?;
        self.charge_memory_expansion(dest_offset, size)?;
        let data = self.state.last_return_data.clone();
        #[expect(clippy::indexing_slicing, reason = "bounds checked above")]
        let slice = &data[source_offset..source_offset.wrapping_add(size)];
        self.state.memory.write_zero_padded(dest_offset, slice, size)
    }

    fn op_extcodehash(&mut self) -> Result<(), VMError> {
        let address = word_to_address(self.state.stack.pop1()?);
        if !self.account_view.account_exists(address) || self.account_view.empty_account(address) {
            return self.state.stack.push(U256::zero());
        }
        let hash = self.account_view.get_code_hash(address);
        self.state.stack.push(U256::from_big_endian(hash.as_bytes()))
    }
}
