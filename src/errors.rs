//! Typed error hierarchy for the interpreter.
//!
//! Mirrors the teacher's convention of distinguishing contract-observable
//! halting conditions (`ExceptionalHalt`) from bugs in the engine itself
//! (`InternalError`), rather than a single stringly-typed error.

use bytes::Bytes;
use thiserror::Error;

/// A halting condition that is part of normal, contract-observable
/// execution (spec §4.5 step 1, §7). These always consume all remaining
/// gas in the frame where they fired and discard that frame's effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid jump destination")]
    InvalidJumpDestination,
    #[error("undefined instruction")]
    UndefinedInstruction,
    #[error("invalid instruction")]
    InvalidInstruction,
    #[error("state modification under a static call")]
    StaticStateModification,
    #[error("memory access outside of returned data bounds")]
    OutOfBounds,
    #[error("value too large to represent")]
    VeryLargeNumber,
}

/// An error that should never be observable as ordinary contract failure:
/// it signals either a host bug or a resource limit that the spec treats
/// as a hard stop (e.g. an arithmetic overflow in bookkeeping that can
/// only happen if an earlier invariant was violated).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("type conversion failed")]
    TypeConversion,
    #[error("message-call depth exceeded the host's recursion budget")]
    CallDepthExceeded,
    #[error("{0}")]
    Custom(String),
}

/// Failure to read from the external account/block view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("account {0:#x} not found")]
    AccountNotFound(ethereum_types::Address),
    #[error("storage key not found")]
    KeyNotFound,
    #[error("database backend error: {0}")]
    Custom(String),
}

/// Top-level error type threaded through every opcode handler and the VM
/// loop. Only `ExceptionalHalt` is a "normal" outcome; the others indicate
/// the engine cannot continue at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VMError {
    #[error(transparent)]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The observable result of a `run()` invocation (spec §6, §7).
///
/// `Failed` corresponds to an exceptional halt: empty output, gas fully
/// consumed, effects discarded. `Revert` preserves remaining gas and
/// carries data back to the caller. `InvalidInput` is precompile-only
/// (spec §7): it is success from the caller's point of view but with an
/// empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Success(Bytes),
    Revert(Bytes),
    Failed,
    InvalidInput,
}

impl Output {
    pub fn is_success(&self) -> bool {
        matches!(self, Output::Success(_))
    }

    pub fn data(&self) -> Bytes {
        match self {
            Output::Success(data) | Output::Revert(data) => data.clone(),
            Output::Failed | Output::InvalidInput => Bytes::new(),
        }
    }
}

/// What a single opcode handler reports back to the VM loop (spec §4.5
/// step 6): whether to advance the program counter normally, whether a
/// jump already moved it, or whether execution of the current frame is
/// over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpcodeResult {
    Continue,
    Jumped,
    Halt(Output),
}
