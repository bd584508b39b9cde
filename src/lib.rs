//! # evm-core
//!
//! A deterministic, stack-based bytecode execution engine for the
//! Ethereum Virtual Machine, covering the Frontier-through-Istanbul
//! opcode and precompile set.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           VM                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │ MachineState│  │   Memory    │  │       Stack         │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! │                                                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │  SubState   │  │ Precompiles │  │     ExecEnv          │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              AccountView / BlockView (spec §6)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key components
//!
//! - [`vm::VM`]: the execution cycle and call-frame state
//! - [`message_call`]: the recursive message-call sub-VM
//! - [`db`]: the `AccountView`/`BlockView` host interface
//! - [`precompiles`]: native implementations of the 8 precompiled contracts
//! - [`opcode_handlers`]: per-category opcode implementations
//!
//! ## Usage
//!
//! ```ignore
//! use evm_core::{Config, ExecEnv, VM};
//!
//! let env = ExecEnv::new(address, caller, origin, gas_price, input_data,
//!     value, code, 0, false, &block_view, Config::istanbul());
//! let result = VM::new(gas_limit, env, account_view).run();
//! ```

pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod gas;
pub mod machine_state;
pub mod memory;
pub mod message_call;
pub mod opcode_handlers;
pub mod opcodes;
pub mod precompiles;
pub mod stack;
pub mod substate;
pub mod utils;
pub mod vm;

pub use db::{AccountView, BlockHeader, BlockView, StorageLookup};
pub use environment::{Config, ExecEnv};
pub use errors::{DatabaseError, ExceptionalHalt, InternalError, Output, OpcodeResult, VMError};
pub use message_call::{CallKind, CallRequest};
pub use opcodes::Opcode;
pub use substate::{LogEntry, SubState};
pub use vm::{RunResult, VM};
