//! `KECCAK256` (spec §4.6), grounded in the teacher's `opcode_handlers`
//! dedicated module for the hash opcode.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::gas;
use crate::utils::size_offset_to_usize;
use crate::vm::VM;
use ethereum_types::U256;
use sha3::{Digest, Keccak256};

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn op_keccak256(&mut self) -> Result<(), VMError> {
        let [offset, size] = *self.state.stack.pop::<2>()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        self.state.consume_gas(gas::keccak256_cost(size)?)?;
        self.charge_memory_expansion(offset, size)?;
        let data = self.state.memory.read(offset, size)?;
        let digest = Keccak256::digest(&data);
        self.state.stack.push(U256::from_big_endian(&digest))
    }
}
