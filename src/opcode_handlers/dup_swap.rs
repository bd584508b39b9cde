//! `DUP1`..`DUP16` and `SWAP1`..`SWAP16` (spec §4.6).

use crate::db::AccountView;
use crate::errors::{InternalError, VMError};
use crate::opcodes::Opcode;
use crate::vm::VM;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn op_dup(&mut self, opcode: Opcode) -> Result<(), VMError> {
        let depth = opcode.dup_depth().ok_or(InternalError::Custom("not a DUP opcode".into()))?;
        self.state.stack.dup(depth)
    }

    pub(crate) fn op_swap(&mut self, opcode: Opcode) -> Result<(), VMError> {
        let depth = opcode.swap_depth().ok_or(InternalError::Custom("not a SWAP opcode".into()))?;
        self.state.stack.swap(depth)
    }
}
