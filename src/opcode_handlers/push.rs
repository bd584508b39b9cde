//! `PUSH1`..`PUSH32` (spec §4.3/§4.6), grounded in the teacher's
//! `opcode_handlers/push.rs`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::opcodes::Opcode;
use crate::vm::VM;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn op_push(&mut self, opcode: Opcode) -> Result<(), VMError> {
        let value = self.read_push_immediate(opcode.immediate_bytes());
        self.state.stack.push(value)
    }
}
