//! `MachineState` — the per-frame mutable execution state (spec §3, §4).
//!
//! Bundles gas, program counter, stack, and memory into the one struct the
//! opcode handlers mutate each cycle, mirroring the teacher's `CallFrame`
//! but without the cross-frame `Rc<RefCell<..>>` sharing (spec §9, see
//! `memory.rs`).

use crate::errors::{ExceptionalHalt, VMError};
use crate::memory::Memory;
use crate::stack::Stack;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct MachineState {
    pub gas_remaining: u64,
    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    /// Output data of the most recently completed sub-call in this frame,
    /// read by `RETURNDATASIZE`/`RETURNDATACOPY` (spec §4.7).
    pub last_return_data: Bytes,
}

impl MachineState {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            gas_remaining: gas_limit,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            last_return_data: Bytes::new(),
        }
    }

    /// Deducts `amount` from the remaining gas, halting with `OutOfGas`
    /// if it would go negative (spec §4.5 step 2).
    pub fn consume_gas(&mut self, amount: u64) -> Result<(), VMError> {
        match self.gas_remaining.checked_sub(amount) {
            Some(remaining) => {
                self.gas_remaining = remaining;
                Ok(())
            }
            None => Err(ExceptionalHalt::OutOfGas.into()),
        }
    }

    /// Advances `pc` past the current opcode and its immediate bytes.
    pub fn advance_pc(&mut self, by: usize) {
        self.pc = self.pc.wrapping_add(by);
    }

    pub fn jump_to(&mut self, destination: usize) {
        self.pc = destination;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_gas_halts_on_insufficient_gas() {
        let mut state = MachineState::new(10);
        assert!(state.consume_gas(5).is_ok());
        assert_eq!(state.gas_remaining, 5);
        assert_eq!(state.consume_gas(6), Err(ExceptionalHalt::OutOfGas.into()));
        // Gas is left untouched by a failed charge.
        assert_eq!(state.gas_remaining, 5);
    }

    #[test]
    fn advance_pc_moves_forward() {
        let mut state = MachineState::new(0);
        state.advance_pc(1);
        state.advance_pc(32);
        assert_eq!(state.pc, 33);
    }
}
