//! Block-context opcodes (spec §4.6), grounded in the teacher's
//! `opcode_handlers/block.rs`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::opcodes::Opcode;
use crate::utils::address_to_word;
use crate::vm::VM;
use ethereum_types::U256;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn exec_block(&mut self, opcode: Opcode) -> Result<(), VMError> {
        let header = self.block_view().header();
        match opcode {
            Opcode::BLOCKHASH => self.op_blockhash(),
            Opcode::COINBASE => self.state.stack.push(address_to_word(header.beneficiary)),
            Opcode::TIMESTAMP => self.state.stack.push(U256::from(header.timestamp)),
            Opcode::NUMBER => self.state.stack.push(U256::from(header.number)),
            Opcode::DIFFICULTY => self.state.stack.push(header.difficulty),
            Opcode::GASLIMIT => self.state.stack.push(U256::from(header.gas_limit)),
            Opcode::CHAINID => self.state.stack.push(U256::from(header.chain_id)),
            _ => unreachable!("exec_block called with non-matching opcode"),
        }
    }

    /// Pushes zero for anything outside the last 256 blocks (spec §4.6),
    /// otherwise the requested ancestor's hash.
    fn op_blockhash(&mut self) -> Result<(), VMError> {
        let block_number = self.state.stack.pop1()?;
        let current = self.block_view().header().number;
        let hash = u64::try_from(block_number)
            .ok()
            .filter(|requested| *requested < current && current.saturating_sub(*requested) <= 256)
            .and_then(|requested| self.block_view().ancestor_header(current.saturating_sub(requested)))
            .map(|header| U256::from_big_endian(header.hash.as_bytes()))
            .unwrap_or_default();
        self.state.stack.push(hash)
    }
}
