//! In-memory `AccountView`/`BlockView` fixture for integration tests.
//! Grounded in the teacher's test-only `Db`/`Account` harness (an
//! in-memory map is all the interpreter's external interface needs).

use evm_core::{AccountView, BlockHeader, BlockView, DatabaseError, StorageLookup};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use sha3::{Digest, Keccak256};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct TestAccountView {
    pub accounts: HashSet<Address>,
    pub balances: HashMap<Address, U256>,
    pub nonces: HashMap<Address, u64>,
    pub code: HashMap<Address, Bytes>,
    pub storage: HashMap<(Address, U256), U256>,
    pub initial_storage: HashMap<(Address, U256), U256>,
}

impl TestAccountView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.accounts.insert(address);
        self.balances.insert(address, balance);
        self
    }

    pub fn with_code(mut self, address: Address, code: Bytes) -> Self {
        self.accounts.insert(address);
        self.code.insert(address, code);
        self
    }

    pub fn with_storage(mut self, address: Address, key: U256, value: U256) -> Self {
        self.accounts.insert(address);
        self.storage.insert((address, key), value);
        self.initial_storage.insert((address, key), value);
        self
    }
}

impl AccountView for TestAccountView {
    fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains(&address)
    }

    fn empty_account(&self, address: Address) -> bool {
        self.get_balance(address).is_zero()
            && self.get_nonce(address) == 0
            && self.get_code(address).is_empty()
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.nonces.get(&address).copied().unwrap_or_default()
    }

    fn get_code(&self, address: Address) -> Bytes {
        self.code.get(&address).cloned().unwrap_or_default()
    }

    fn get_code_hash(&self, address: Address) -> H256 {
        let code = self.get_code(address);
        if code.is_empty() {
            H256::zero()
        } else {
            H256::from_slice(&Keccak256::digest(&code))
        }
    }

    fn get_storage(&self, address: Address, key: U256) -> StorageLookup {
        if !self.accounts.contains(&address) {
            return StorageLookup::AccountNotFound;
        }
        match self.storage.get(&(address, key)) {
            Some(value) => StorageLookup::Found(*value),
            None => StorageLookup::KeyNotFound,
        }
    }

    fn get_initial_storage(&self, address: Address, key: U256) -> StorageLookup {
        if !self.accounts.contains(&address) {
            return StorageLookup::AccountNotFound;
        }
        match self.initial_storage.get(&(address, key)) {
            Some(value) => StorageLookup::Found(*value),
            None => StorageLookup::KeyNotFound,
        }
    }

    fn put_storage(&self, address: Address, key: U256, value: U256) -> Self {
        let mut next = self.clone();
        next.accounts.insert(address);
        next.storage.insert((address, key), value);
        next
    }

    fn remove_storage(&self, address: Address, key: U256) -> Self {
        let mut next = self.clone();
        next.storage.remove(&(address, key));
        next
    }

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<Self, DatabaseError> {
        let mut next = self.clone();
        let from_balance = next.get_balance(from);
        let new_from_balance = from_balance
            .checked_sub(value)
            .ok_or_else(|| DatabaseError::Custom(format!("insufficient balance at {from:#x}")))?;
        next.balances.insert(from, new_from_balance);
        let to_balance = next.get_balance(to);
        next.balances.insert(to, to_balance.saturating_add(value));
        next.accounts.insert(to);
        Ok(next)
    }

    fn increment_nonce(&self, address: Address) -> Self {
        let mut next = self.clone();
        next.accounts.insert(address);
        let nonce = next.get_nonce(address);
        next.nonces.insert(address, nonce.saturating_add(1));
        next
    }

    fn clear_balance(&self, address: Address) -> Self {
        let mut next = self.clone();
        next.balances.insert(address, U256::zero());
        next
    }

    fn set_code(&self, address: Address, code: Bytes) -> Self {
        let mut next = self.clone();
        next.accounts.insert(address);
        next.code.insert(address, code);
        next
    }
}

pub struct TestBlockView {
    pub header: BlockHeader,
    pub ancestors: HashMap<u64, BlockHeader>,
}

impl TestBlockView {
    pub fn new(header: BlockHeader) -> Self {
        Self { header, ancestors: HashMap::new() }
    }
}

impl BlockView for TestBlockView {
    fn header(&self) -> BlockHeader {
        self.header
    }

    fn ancestor_header(&self, n: u64) -> Option<BlockHeader> {
        let target = self.header.number.checked_sub(n)?;
        self.ancestors.get(&target).copied()
    }
}

pub fn default_header() -> BlockHeader {
    BlockHeader {
        number: 100,
        timestamp: 1_700_000_000,
        difficulty: U256::from(1),
        gas_limit: 30_000_000,
        beneficiary: Address::from_low_u64_be(0xb15e),
        chain_id: 1,
        base_fee: U256::zero(),
        hash: H256::zero(),
    }
}
