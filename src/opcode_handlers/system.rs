//! `CREATE`/`CALL`/`RETURN`/`DELEGATECALL`/`CREATE2`/`STATICCALL`/`REVERT`/
//! `SELFDESTRUCT` (spec §4.6, §4.7). Grounded in the teacher's
//! `opcode_handlers/system.rs` call-building pattern, restructured around
//! `message_call::execute_call` and synchronous recursion (spec §5).

use crate::constants::{
    GAS_CALL_NEW_ACCOUNT, GAS_CALL_STIPEND, GAS_CALL_VALUE, GAS_CODE_DEPOSIT, GAS_SELFDESTRUCT_REFUND,
    MAX_CODE_SIZE,
};
use crate::db::AccountView;
use crate::errors::{ExceptionalHalt, InternalError, OpcodeResult, Output, VMError};
use crate::gas;
use crate::message_call::{execute_call, CallKind, CallRequest};
use crate::utils::{address_to_word, size_offset_to_usize, word_to_address};
use crate::vm::VM;
use bytes::Bytes;
use ethereum_types::{Address, U256};
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

impl<'a, AV: AccountView> VM<'a, AV> {
    pub(crate) fn op_create(&mut self) -> Result<OpcodeResult, VMError> {
        let [value, offset, size] = *self.state.stack.pop::<3>()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        self.charge_memory_expansion(offset, size)?;
        let init_code = self.state.memory.read(offset, size)?;

        let nonce = self.account_view.get_nonce(self.env.address);
        let new_address = legacy_create_address(self.env.address, nonce);
        self.run_init_code(value, new_address, init_code)
    }

    pub(crate) fn op_create2(&mut self) -> Result<OpcodeResult, VMError> {
        let [value, offset, size, salt] = *self.state.stack.pop::<4>()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        self.charge_memory_expansion(offset, size)?;
        let init_code = self.state.memory.read(offset, size)?;

        self.state.consume_gas(gas::keccak256_cost(init_code.len())?)?;
        let new_address = create2_address(self.env.address, salt, &init_code);
        self.run_init_code(value, new_address, init_code)
    }

    /// Shared `CREATE`/`CREATE2` tail: balance/depth checks, recursive run
    /// of `init_code` as a fresh frame, EIP-170 size check, deposit gas,
    /// and the push of the new address (or zero on failure).
    fn run_init_code(&mut self, value: U256, new_address: Address, init_code: Bytes) -> Result<OpcodeResult, VMError> {
        if self.account_view.get_balance(self.env.address) < value {
            return self.push_create_failure();
        }
        let depth = self.env.depth.wrapping_add(1);
        if depth >= crate::constants::CALL_DEPTH_LIMIT {
            return self.push_create_failure();
        }

        let forwarded_gas = self.state.gas_remaining;
        self.state.gas_remaining = 0;

        let mut child_view = self.account_view.clone().increment_nonce(self.env.address);
        if !value.is_zero() {
            child_view = child_view.transfer(self.env.address, new_address, value)?;
        }

        let child_env = crate::environment::ExecEnv::new(
            new_address,
            self.env.address,
            self.env.origin,
            self.env.gas_price,
            Bytes::new(),
            value,
            init_code,
            depth,
            self.env.is_static,
            self.env.block_view,
            self.env.config,
        );
        let child_vm = VM::new(forwarded_gas, child_env, child_view);
        let result = child_vm.run();

        match result.output {
            Output::Success(deployed_code) if deployed_code.len() <= MAX_CODE_SIZE => {
                let deposit_cost = GAS_CODE_DEPOSIT.saturating_mul(
                    u64::try_from(deployed_code.len()).map_err(|_| InternalError::TypeConversion)?,
                );
                if result.remaining_gas < deposit_cost {
                    self.state.gas_remaining = self.state.gas_remaining.saturating_add(result.remaining_gas);
                    return self.push_create_failure();
                }
                self.account_view = result.account_view.set_code(new_address, deployed_code);
                self.substate.merge_child(result.substate);
                self.substate.mark_touched(new_address);
                self.state.gas_remaining =
                    self.state.gas_remaining.saturating_add(result.remaining_gas.saturating_sub(deposit_cost));
                self.state.stack.push(address_to_word(new_address))?;
                Ok(OpcodeResult::Continue)
            }
            _ => {
                self.state.gas_remaining = self.state.gas_remaining.saturating_add(result.remaining_gas);
                self.push_create_failure()
            }
        }
    }

    fn push_create_failure(&mut self) -> Result<OpcodeResult, VMError> {
        self.state.stack.push(U256::zero())?;
        Ok(OpcodeResult::Continue)
    }

    pub(crate) fn op_call(&mut self) -> Result<OpcodeResult, VMError> {
        let [gas, address, value, args_offset, args_size, ret_offset, ret_size] = *self.state.stack.pop::<7>()?;
        if self.env.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::StaticStateModification.into());
        }
        let target = word_to_address(address);
        self.dispatch_call(CallKind::Call, gas, target, target, value, args_offset, args_size, ret_offset, ret_size)
    }

    pub(crate) fn op_callcode(&mut self) -> Result<OpcodeResult, VMError> {
        let [gas, address, value, args_offset, args_size, ret_offset, ret_size] = *self.state.stack.pop::<7>()?;
        let target = word_to_address(address);
        self.dispatch_call(
            CallKind::CallCode,
            gas,
            self.env.address,
            target,
            value,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )
    }

    pub(crate) fn op_delegatecall(&mut self) -> Result<OpcodeResult, VMError> {
        let [gas, address, args_offset, args_size, ret_offset, ret_size] = *self.state.stack.pop::<6>()?;
        let target = word_to_address(address);
        self.dispatch_call(
            CallKind::DelegateCall,
            gas,
            self.env.address,
            target,
            self.env.value_in_wei,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )
    }

    pub(crate) fn op_staticcall(&mut self) -> Result<OpcodeResult, VMError> {
        let [gas, address, args_offset, args_size, ret_offset, ret_size] = *self.state.stack.pop::<6>()?;
        let target = word_to_address(address);
        self.dispatch_call(
            CallKind::StaticCall,
            gas,
            target,
            target,
            U256::zero(),
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )
    }

    /// Builds a `CallRequest` for any of the four `CALL`-family opcodes and
    /// drives it through `message_call::execute_call` (spec §4.7).
    #[allow(clippy::too_many_arguments)]
    fn dispatch_call(
        &mut self,
        kind: CallKind,
        gas_requested: U256,
        recipient: Address,
        code_owner: Address,
        value: U256,
        args_offset: U256,
        args_size: U256,
        ret_offset: U256,
        ret_size: U256,
    ) -> Result<OpcodeResult, VMError> {
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;
        self.charge_memory_expansion(args_offset, args_size)?;
        self.charge_memory_expansion(ret_offset, ret_size)?;
        let data = self.state.memory.read(args_offset, args_size)?;

        let transfers_value = matches!(kind, CallKind::Call | CallKind::CallCode) && !value.is_zero();
        let creates_new_account = matches!(kind, CallKind::Call)
            && transfers_value
            && (!self.account_view.account_exists(recipient)
                || (self.env.config.empty_account_value_transfer && self.account_view.empty_account(recipient)));

        let mut cost = self.env.config.call_cost;
        if transfers_value {
            cost = cost.saturating_add(GAS_CALL_VALUE);
        }
        if creates_new_account {
            cost = cost.saturating_add(GAS_CALL_NEW_ACCOUNT);
        }
        self.state.consume_gas(cost)?;

        let forwarded = gas::call_forwarding(gas_requested, self.state.gas_remaining);
        self.state.gas_remaining = self.state.gas_remaining.saturating_sub(forwarded);
        let execution_gas = if transfers_value { forwarded.saturating_add(GAS_CALL_STIPEND) } else { forwarded };

        // DELEGATECALL runs the callee's code in the current frame's own
        // storage/balance context but keeps the grandparent's caller and
        // value (spec §4.7), so the child's `caller` must skip past this
        // frame's own address.
        let sender = if matches!(kind, CallKind::DelegateCall) { self.env.caller } else { self.env.address };
        let request = CallRequest {
            sender,
            originator: self.env.origin,
            recipient,
            code_owner,
            gas_price: self.env.gas_price,
            value,
            execution_gas,
            data,
            is_static: self.env.is_static || matches!(kind, CallKind::StaticCall),
            kind,
            out_offset: ret_offset,
            out_size: ret_size,
        };
        execute_call(self, request)?;
        Ok(OpcodeResult::Continue)
    }

    pub(crate) fn op_return(&mut self) -> Result<OpcodeResult, VMError> {
        let output = self.read_halt_output()?;
        Ok(OpcodeResult::Halt(Output::Success(output)))
    }

    pub(crate) fn op_revert(&mut self) -> Result<OpcodeResult, VMError> {
        let output = self.read_halt_output()?;
        Ok(OpcodeResult::Halt(Output::Revert(output)))
    }

    pub(crate) fn op_selfdestruct(&mut self) -> Result<OpcodeResult, VMError> {
        let beneficiary = word_to_address(self.state.stack.pop1()?);
        let new_account = self.env.config.empty_account_value_transfer && !self.account_view.account_exists(beneficiary);
        self.state.consume_gas(self.env.config.selfdestruct_cost(new_account))?;

        let balance = self.account_view.get_balance(self.env.address);
        if !balance.is_zero() {
            self.account_view = self.account_view.transfer(self.env.address, beneficiary, balance)?;
        }
        self.account_view = self.account_view.clear_balance(self.env.address);
        self.substate.mark_touched(beneficiary);
        if self.substate.mark_self_destruct(self.env.address) {
            self.substate.add_refund(GAS_SELFDESTRUCT_REFUND);
        }

        Ok(OpcodeResult::Halt(Output::Success(Bytes::new())))
    }
}

/// Pre-EIP-1014 `CREATE` address: low 20 bytes of `keccak256(rlp([sender, nonce]))`.
fn legacy_create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender);
    stream.append(&nonce);
    let digest = Keccak256::digest(stream.out());
    Address::from_slice(&digest[12..32])
}

/// [EIP-1014] `CREATE2` address: low 20 bytes of
/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))`.
fn create2_address(sender: Address, salt: U256, init_code: &[u8]) -> Address {
    let init_code_hash = Keccak256::digest(init_code);
    let mut salt_bytes = [0u8; 32];
    salt.to_big_endian(&mut salt_bytes);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(&salt_bytes);
    preimage.extend_from_slice(&init_code_hash);

    let digest = Keccak256::digest(&preimage);
    Address::from_slice(&digest[12..32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create2_address_changes_with_salt() {
        let sender = Address::from_low_u64_be(0x1234);
        let code = [0x60u8, 0x00];
        let a = create2_address(sender, U256::from(1), &code);
        let b = create2_address(sender, U256::from(2), &code);
        assert_ne!(a, b);
    }

    #[test]
    fn legacy_create_address_changes_with_nonce() {
        let sender = Address::from_low_u64_be(0xabcd);
        let a = legacy_create_address(sender, 0);
        let b = legacy_create_address(sender, 1);
        assert_ne!(a, b);
    }
}
