//! The message-call sub-VM (spec §4.7): builds a child `ExecEnv`,
//! recursively invokes `VM::run`, and folds the result back into the
//! parent frame. Grounded in the teacher's call-handling in
//! `opcode_handlers/system.rs`, restructured as synchronous recursion
//! (spec §5/§9) rather than a shared call-frame stack.

use crate::constants::CALL_DEPTH_LIMIT;
use crate::db::AccountView;
use crate::environment::ExecEnv;
use crate::errors::{Output, VMError};
use crate::precompiles;
use crate::vm::VM;
use bytes::Bytes;
use ethereum_types::{Address, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// One nested message-call request (spec §4.7). `recipient` is the
/// address the child frame executes *as* (storage/balance context);
/// `code_owner` is whose code is loaded — they differ for
/// `CALLCODE`/`DELEGATECALL`.
pub struct CallRequest {
    pub sender: Address,
    pub originator: Address,
    pub recipient: Address,
    pub code_owner: Address,
    pub gas_price: U256,
    pub value: U256,
    pub execution_gas: u64,
    pub data: Bytes,
    pub is_static: bool,
    pub kind: CallKind,
    pub out_offset: usize,
    pub out_size: usize,
}

/// Executes `request` against `vm`'s current account view, pushing the
/// EVM-standard success/failure flag and writing outcome effects back
/// into `vm` (spec §4.7 "Child outcome handling").
pub fn execute_call<AV: AccountView>(vm: &mut VM<'_, AV>, request: CallRequest) -> Result<(), VMError> {
    let depth = vm.env.depth.wrapping_add(1);

    if depth >= CALL_DEPTH_LIMIT {
        vm.state.gas_remaining = vm.state.gas_remaining.saturating_add(request.execution_gas);
        return vm.state.stack.push(U256::zero());
    }

    let transfers_value = matches!(request.kind, CallKind::Call | CallKind::CallCode) && !request.value.is_zero();
    if transfers_value && vm.account_view.get_balance(request.sender) < request.value {
        vm.state.gas_remaining = vm.state.gas_remaining.saturating_add(request.execution_gas);
        return vm.state.stack.push(U256::zero());
    }

    if let Some(id) = precompiles::precompile_id(request.code_owner) {
        let result = precompiles::dispatch(id, request.execution_gas, &request.data, &vm.env.config);
        let output = match result.outcome {
            precompiles::PrecompileOutcome::Success => Output::Success(result.output),
            precompiles::PrecompileOutcome::InvalidInput => Output::InvalidInput,
            precompiles::PrecompileOutcome::OutOfGas => Output::Failed,
        };
        return finish_call(vm, request, result.remaining_gas, output);
    }

    let code = vm.account_view.get_code(request.code_owner);
    let mut child_account_view = vm.account_view.clone();
    if transfers_value {
        child_account_view = child_account_view.transfer(request.sender, request.recipient, request.value)?;
    }

    let child_env = ExecEnv::new(
        request.recipient,
        request.sender,
        request.originator,
        request.gas_price,
        request.data.clone(),
        request.value,
        code,
        depth,
        request.is_static,
        vm.env.block_view,
        vm.env.config,
    );

    let child_vm = VM::new(request.execution_gas, child_env, child_account_view);
    let result = child_vm.run();

    // Success commits the child's account view and merges its sub-state
    // (spec §4.7); REVERT and exceptional-halt failure discard both,
    // keeping the parent's pre-call view (spec §5).
    if matches!(result.output, Output::Success(_)) {
        vm.account_view = result.account_view;
        vm.substate.merge_child(result.substate);
        vm.substate.mark_touched(request.recipient);
    }

    finish_call(vm, request, result.remaining_gas, result.output)
}

/// Applies the spec §4.7 outcome rules common to precompiles and
/// contract calls: push flag, refund leftover gas, copy output into the
/// requested memory window, stash `last_return_data`.
fn finish_call<AV: AccountView>(
    vm: &mut VM<'_, AV>,
    request: CallRequest,
    remaining_gas: u64,
    output: Output,
) -> Result<(), VMError> {
    // `InvalidInput` pushes success too (spec §7): the precompile ran,
    // it just had nothing sensible to say back.
    let success = matches!(output, Output::Success(_) | Output::InvalidInput);
    let data = output.data();

    vm.state.gas_remaining = vm.state.gas_remaining.saturating_add(remaining_gas);
    vm.state.memory.write_zero_padded(request.out_offset, &data, request.out_size)?;
    vm.state.last_return_data = data;

    vm.state.stack.push(if success { U256::one() } else { U256::zero() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_kind_distinguishes_value_transfer_eligibility() {
        assert!(matches!(CallKind::Call, CallKind::Call));
        assert_ne!(CallKind::Call, CallKind::StaticCall);
    }
}
