//! `LOG0`..`LOG4` (spec §4.6), grounded in the teacher's
//! `opcode_handlers/log.rs`. Static-state-modification under a `static`
//! frame is caught centrally in `vm::VM::is_state_modifying`.

use crate::db::AccountView;
use crate::errors::VMError;
use crate::gas;
use crate::opcodes::Opcode;
use crate::substate::LogEntry;
use crate::utils::size_offset_to_usize;
use crate::vm::VM;
use ethereum_types::H256;

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn op_log(&mut self, opcode: Opcode) -> Result<(), VMError> {
        let topic_count = opcode
            .log_topic_count()
            .ok_or_else(|| crate::errors::InternalError::Custom("not a LOG opcode".into()))?;

        let [offset, size] = *self.state.stack.pop::<2>()?;
        let mut topics = Vec::with_capacity(topic_count);
        for _ in 0..topic_count {
            let topic = self.state.stack.pop1()?;
            let mut bytes = [0u8; 32];
            topic.to_big_endian(&mut bytes);
            topics.push(H256::from(bytes));
        }

        let (size, offset) = size_offset_to_usize(size, offset)?;
        self.state.consume_gas(gas::log_cost(size, topic_count)?)?;
        self.charge_memory_expansion(offset, size)?;
        let data = self.state.memory.read(offset, size)?;

        self.substate.append_log(LogEntry { address: self.env.address, topics, data });
        Ok(())
    }
}
