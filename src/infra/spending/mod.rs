// Ledger store implementations.

#[cfg_attr(not(test), allow(dead_code))]
pub mod in_memory;
pub mod json_store;
pub mod sqlite_store;

#[cfg(test)]
pub use in_memory::InMemoryLedgerStore;
pub use json_store::JsonLedgerStore;
pub use sqlite_store::SqliteLedgerStore;

use crate::core::spending::{LedgerError, LedgerStore, SpenderTotal};
use async_trait::async_trait;

/// The durable store picked at start-up.
pub enum LedgerBackend {
    Json(JsonLedgerStore),
    Sqlite(SqliteLedgerStore),
}

#[async_trait]
impl LedgerStore for LedgerBackend {
    async fn total_for(&self, user_id: u64) -> Result<u64, LedgerError> {
        match self {
            LedgerBackend::Json(store) => store.total_for(user_id).await,
            LedgerBackend::Sqlite(store) => store.total_for(user_id).await,
        }
    }

    async fn add_spend(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError> {
        match self {
            LedgerBackend::Json(store) => store.add_spend(user_id, amount).await,
            LedgerBackend::Sqlite(store) => store.add_spend(user_id, amount).await,
        }
    }

    async fn top_spenders(&self, limit: usize) -> Result<Vec<SpenderTotal>, LedgerError> {
        match self {
            LedgerBackend::Json(store) => store.top_spenders(limit).await,
            LedgerBackend::Sqlite(store) => store.top_spenders(limit).await,
        }
    }
}
