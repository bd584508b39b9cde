//! `POP`/memory/storage/control-flow opcodes that don't belong to a more
//! specific category (spec §4.6), grounded in the teacher's
//! `opcode_handlers/stack_memory_storage_flow.rs`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::gas::{self, SstoreNetCost};
use crate::opcodes::Opcode;
use crate::utils::u256_to_usize_saturating;
use crate::vm::VM;
use ethereum_types::U256;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn exec_stack_memory_storage_flow(&mut self, opcode: Opcode) -> Result<(), VMError> {
        match opcode {
            Opcode::POP => self.state.stack.pop1().map(|_| ()),
            Opcode::MLOAD => self.op_mload(),
            Opcode::MSTORE => self.op_mstore(),
            Opcode::MSTORE8 => self.op_mstore8(),
            Opcode::SLOAD => self.op_sload(),
            Opcode::SSTORE => self.op_sstore(),
            Opcode::PC => self.state.stack.push(U256::from(self.state.pc)),
            Opcode::MSIZE => self.state.stack.push(U256::from(self.state.memory.len())),
            Opcode::GAS => self.state.stack.push(U256::from(self.state.gas_remaining)),
            Opcode::JUMPDEST => Ok(()),
            _ => unreachable!("exec_stack_memory_storage_flow called with non-matching opcode"),
        }
    }

    fn op_mload(&mut self) -> Result<(), VMError> {
        let offset = u256_to_usize_saturating(self.state.stack.pop1()?);
        self.charge_memory_expansion(offset, 32)?;
        let word = self.state.memory.read_word(offset)?;
        self.state.stack.push(word)
    }

    fn op_mstore(&mut self) -> Result<(), VMError> {
        let [offset, value] = *self.state.stack.pop::<2>()?;
        let offset = u256_to_usize_saturating(offset);
        self.charge_memory_expansion(offset, 32)?;
        self.state.memory.write_word(offset, value)
    }

    fn op_mstore8(&mut self) -> Result<(), VMError> {
        let [offset, value] = *self.state.stack.pop::<2>()?;
        let offset = u256_to_usize_saturating(offset);
        self.charge_memory_expansion(offset, 1)?;
        self.state.memory.write8(offset, value)
    }

    fn op_sload(&mut self) -> Result<(), VMError> {
        let key = self.state.stack.pop1()?;
        let value = self.account_view.get_storage(self.env.address, key).or_zero();
        self.state.stack.push(value)
    }

    fn op_sstore(&mut self) -> Result<(), VMError> {
        let [key, new_value] = *self.state.stack.pop::<2>()?;
        let current = self.account_view.get_storage(self.env.address, key).or_zero();

        if self.env.config.eip1283_sstore_refund {
            let initial = self.account_view.get_initial_storage(self.env.address, key).or_zero();
            let SstoreNetCost { gas_cost, refund_delta } =
                gas::sstore_cost_net_metered(initial, current, new_value);
            self.state.consume_gas(gas_cost)?;
            self.substate.add_refund(refund_delta);
        } else {
            let cost = gas::sstore_cost_legacy(current, new_value);
            self.state.consume_gas(cost)?;
            if !current.is_zero() && new_value.is_zero() {
                self.substate.add_refund(crate::constants::GAS_SSTORE_CLEAR_REFUND);
            }
        }

        if new_value.is_zero() {
            self.account_view = self.account_view.remove_storage(self.env.address, key);
        } else {
            self.account_view = self.account_view.put_storage(self.env.address, key, new_value);
        }
        Ok(())
    }
}

impl<'a, AV: AccountView> VM<'a, AV> {
    /// `JUMP`'s destination check (spec §4.5 step 1/6).
    pub(crate) fn op_jump(&mut self) -> Result<(), VMError> {
        let destination = self.state.stack.pop1()?;
        let destination = self.validated_jump_target(destination)?;
        self.state.jump_to(destination);
        Ok(())
    }

    /// Returns whether a jump was taken (spec §4.5 step 6): `PC` is
    /// advanced normally by the caller when it returns `false`.
    pub(crate) fn op_jumpi(&mut self) -> Result<bool, VMError> {
        let [destination, condition] = *self.state.stack.pop::<2>()?;
        if condition.is_zero() {
            return Ok(false);
        }
        let destination = self.validated_jump_target(destination)?;
        self.state.jump_to(destination);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_sstore_cost_matches_transition_table() {
        assert_eq!(gas::sstore_cost_legacy(U256::zero(), U256::from(1)), crate::constants::GAS_SSTORE_SET);
    }
}
