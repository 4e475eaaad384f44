// In-memory implementation of LedgerStore.
//
// Nothing is persisted, so this is only useful for tests and local experiments.
// It honours the same contract as the file and database stores.

use crate::core::spending::{LedgerError, LedgerStore, SpenderTotal};
use async_trait::async_trait;
use dashmap::DashMap;

/// Maps user_id -> cumulative GP spent.
pub struct InMemoryLedgerStore {
    totals: DashMap<u64, u64>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            totals: DashMap::new(),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn total_for(&self, user_id: u64) -> Result<u64, LedgerError> {
        Ok(self.totals.get(&user_id).map(|entry| *entry).unwrap_or(0))
    }

    async fn add_spend(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        // entry() holds the shard lock, so the read-modify-write is atomic
        let mut entry = self.totals.entry(user_id).or_insert(0);
        *entry = entry.saturating_add(amount);
        Ok(*entry)
    }

    async fn top_spenders(&self, limit: usize) -> Result<Vec<SpenderTotal>, LedgerError> {
        let mut spenders: Vec<SpenderTotal> = self
            .totals
            .iter()
            .map(|entry| SpenderTotal {
                user_id: *entry.key(),
                total: *entry.value(),
            })
            .collect();
        // DashMap has no iteration order, so break ties on user id explicitly
        spenders.sort_by(|a, b| b.total.cmp(&a.total).then(a.user_id.cmp(&b.user_id)));
        spenders.truncate(limit);
        Ok(spenders)
    }
}
