//! `SubState` — the transactional side-effect record for one call (spec
//! §3, §4.5, §9).
//!
//! The merge-on-success / discard-on-failure rule and the self-destruct
//! refund dedup are grounded in the teacher's `Substate` checkpoint
//! mechanism (`vm.rs`: `push_backup`/`commit_backup`/`revert_backup`),
//! simplified here to a pure-constructor `merge` since each nested call
//! owns an independent `SubState` rather than sharing one substate stack
//! (spec §9 "Arena ownership").

use crate::constants::GAS_SELFDESTRUCT_REFUND;
use ethereum_types::{Address, H256};
use rustc_hash::FxHashSet;

/// A single `LOG0`..`LOG4` entry (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: bytes::Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct SubState {
    pub self_destruct_set: FxHashSet<Address>,
    pub touched: FxHashSet<Address>,
    pub logs: Vec<LogEntry>,
    pub refund: i64,
}

impl SubState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_touched(&mut self, address: Address) {
        self.touched.insert(address);
    }

    /// Queues `address` for destruction if it isn't already queued,
    /// returning whether it was newly added (callers use this to decide
    /// whether to add the `+24000` refund — spec §4.6, §4.4).
    pub fn mark_self_destruct(&mut self, address: Address) -> bool {
        self.self_destruct_set.insert(address)
    }

    pub fn add_refund(&mut self, amount: i64) {
        self.refund = self.refund.saturating_add(amount);
    }

    pub fn append_log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }

    /// Merges a successfully-returned child substate into `self` (spec
    /// §3): union of touched/self-destruct sets, log concatenation in
    /// call order, summed refunds — minus one `selfdestruct_refund` per
    /// address that was already queued in the parent, since the refund
    /// was already counted there.
    pub fn merge_child(&mut self, child: SubState) {
        for address in child.self_destruct_set {
            if !self.self_destruct_set.insert(address) {
                self.refund = self.refund.saturating_sub(GAS_SELFDESTRUCT_REFUND);
            }
        }
        self.touched.extend(child.touched);
        self.logs.extend(child.logs);
        self.refund = self.refund.saturating_add(child.refund);
    }
}
