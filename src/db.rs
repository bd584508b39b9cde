//! External interfaces the core consumes (spec §6), modeled as traits.
//!
//! Grounded in the teacher's `db/mod.rs` `Database` trait: the engine only
//! ever talks to the outside world through this boundary, and every
//! mutation returns a new view rather than mutating in place, so the
//! "snapshot per sub-call, commit-or-discard at the boundary" rule in
//! spec §5 can be implemented purely in terms of value semantics.

use crate::errors::DatabaseError;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// Outcome of a `get_storage`/`get_initial_storage` lookup (spec §6):
/// distinguishes "account doesn't exist" from "account exists, slot is
/// unset" because EIP-1283's refund table needs the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLookup {
    Found(U256),
    AccountNotFound,
    KeyNotFound,
}

impl StorageLookup {
    /// Collapses "missing" cases to the EVM's standard zero value, the
    /// way every opcode except the EIP-1283 cost calculation wants it.
    pub fn or_zero(self) -> U256 {
        match self {
            StorageLookup::Found(v) => v,
            StorageLookup::AccountNotFound | StorageLookup::KeyNotFound => U256::zero(),
        }
    }
}

/// Account/world-state view consumed by the interpreter (spec §6).
///
/// Every mutating method returns `Self` by value: callers thread the
/// returned view forward, and a sub-call that fails or reverts simply
/// drops its view and keeps the one it started with (spec §5).
pub trait AccountView: Clone {
    fn account_exists(&self, address: Address) -> bool;

    /// `balance == 0 && nonce == 0 && code.is_empty()` (spec §6, EIP-161).
    fn empty_account(&self, address: Address) -> bool;

    fn get_balance(&self, address: Address) -> U256;

    fn get_nonce(&self, address: Address) -> u64;

    fn get_code(&self, address: Address) -> Bytes;

    fn get_code_hash(&self, address: Address) -> H256;

    fn get_storage(&self, address: Address, key: U256) -> StorageLookup;

    /// Pre-transaction snapshot of storage, needed for EIP-1283's
    /// `(initial, current, new)` refund table.
    fn get_initial_storage(&self, address: Address, key: U256) -> StorageLookup;

    fn put_storage(&self, address: Address, key: U256, value: U256) -> Self;

    fn remove_storage(&self, address: Address, key: U256) -> Self;

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<Self, DatabaseError>
    where
        Self: Sized;

    fn increment_nonce(&self, address: Address) -> Self;

    fn clear_balance(&self, address: Address) -> Self;

    /// Deploys `init_code` run in a fresh frame at `new_addr`, transferring
    /// `value` from `creator`. Returns the updated view and the address's
    /// final deployed-code state; callers (`CREATE`/`CREATE2` handlers)
    /// are responsible for running `init_code` through `run()` themselves
    /// — this method exists only as the interface contract named in spec
    /// §6; the engine's own `CREATE` implementation drives it directly via
    /// `message_call`, so a default host needs only the storage/balance
    /// primitives above to implement it.
    fn set_code(&self, address: Address, code: Bytes) -> Self;
}

/// Block/chain context consumed by `BLOCKHASH`, `COINBASE`, etc.
/// (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub beneficiary: Address,
    pub chain_id: u64,
    pub base_fee: U256,
    pub hash: H256,
}

pub trait BlockView {
    fn header(&self) -> BlockHeader;

    /// Header of the `n`-th most recent ancestor, for `n` in the last 256
    /// blocks; `None` outside that window or before genesis.
    fn ancestor_header(&self, n: u64) -> Option<BlockHeader>;
}
