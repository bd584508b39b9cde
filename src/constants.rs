//! Shared numeric constants used across the interpreter.

/// Size of an EVM word, in bytes.
pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

/// Maximum stack depth, per spec §3.
pub const STACK_LIMIT: usize = 1024;

/// Maximum message-call depth, per spec §5.
pub const CALL_DEPTH_LIMIT: usize = 1024;

/// Divisor in the quadratic term of the memory expansion cost formula,
/// `C_mem(a) = 3a + floor(a^2 / MEMORY_EXPANSION_QUOTIENT)`.
pub const MEMORY_EXPANSION_QUOTIENT: u64 = 512;

/// Static gas tiers (spec §4.4).
pub const GAS_ZERO: u64 = 0;
pub const GAS_BASE: u64 = 2;
pub const GAS_VERY_LOW: u64 = 3;
pub const GAS_LOW: u64 = 5;
pub const GAS_MID: u64 = 8;
pub const GAS_HIGH: u64 = 10;
pub const GAS_JUMPDEST: u64 = 1;
pub const GAS_CREATE: u64 = 32000;
pub const GAS_BLOCKHASH: u64 = 20;
pub const GAS_KECCAK256: u64 = 30;
pub const GAS_KECCAK256_WORD: u64 = 6;
pub const GAS_COPY_WORD: u64 = 3;
pub const GAS_LOG: u64 = 375;
pub const GAS_LOG_DATA: u64 = 8;
pub const GAS_LOG_TOPIC: u64 = 375;
pub const GAS_CALL_VALUE: u64 = 9000;
pub const GAS_CALL_NEW_ACCOUNT: u64 = 25000;
pub const GAS_CALL_STIPEND: u64 = 2300;
pub const GAS_SELFDESTRUCT_REFUND: i64 = 24000;
pub const GAS_SSTORE_SET: u64 = 20000;
pub const GAS_SSTORE_RESET: u64 = 5000;
pub const GAS_SSTORE_CLEAR_REFUND: i64 = 15000;
pub const GAS_CODE_DEPOSIT: u64 = 200;
pub const GAS_EXP: u64 = 10;

/// Contract init-code size ceiling ([EIP-3860] adjacent value, used only to
/// bound `CREATE`/`CREATE2` deposit gas computation from overflowing).
pub const INIT_CODE_MAX_SIZE: usize = 49152;

/// [EIP-170] deployed-code size ceiling, enforced on every `CREATE`/
/// `CREATE2` regardless of fork (see DESIGN.md Open Question).
pub const MAX_CODE_SIZE: usize = 24576;

/// EIP-150 "all but one 64th" divisor used to clamp gas forwarded on calls.
pub const CALL_GAS_RETENTION_DIVISOR: u64 = 64;

/// Reserved precompile address range, low byte values 0x01..=0x08.
pub const PRECOMPILE_ECRECOVER: u8 = 0x01;
pub const PRECOMPILE_SHA256: u8 = 0x02;
pub const PRECOMPILE_RIPEMD160: u8 = 0x03;
pub const PRECOMPILE_IDENTITY: u8 = 0x04;
pub const PRECOMPILE_MODEXP: u8 = 0x05;
pub const PRECOMPILE_EC_ADD: u8 = 0x06;
pub const PRECOMPILE_EC_MUL: u8 = 0x07;
pub const PRECOMPILE_EC_PAIRING: u8 = 0x08;
pub const MAX_PRECOMPILE_ADDRESS: u8 = PRECOMPILE_EC_PAIRING;

/// `SELFDESTRUCT` success sentinel output (empty).
pub const SUCCESS: &[u8] = &[];
pub const FAIL: &[u8] = &[];
