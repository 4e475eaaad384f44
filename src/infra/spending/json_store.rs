use crate::core::spending::{LedgerError, LedgerStore, SpenderTotal};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// JSON-backed ledger. The whole ledger lives in a single file as an object:
/// { "user_id": total_gp }
///
/// Every mutation rewrites the entire file.
pub struct JsonLedgerStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<u64, u64>>,
}

impl JsonLedgerStore {
    /// Load the ledger from `path`, or start empty if the file doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            Self::read(&path)?
        } else {
            BTreeMap::new()
        };

        tracing::info!(path = %path.display(), entries = cache.len(), "Loaded spending ledger");

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    fn read(path: &Path) -> anyhow::Result<BTreeMap<u64, u64>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn persist(&self, ledger: &BTreeMap<u64, u64>) -> Result<(), LedgerError> {
        let file = File::create(&self.path).map_err(|e| LedgerError::StorageError(e.to_string()))?;
        serde_json::to_writer(file, ledger).map_err(|e| LedgerError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn total_for(&self, user_id: u64) -> Result<u64, LedgerError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&user_id).copied().unwrap_or(0))
    }

    async fn add_spend(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        // Hold the write lock through the file write so the file never lags the cache.
        let mut cache = self.cache.write().await;
        let previous = cache.get(&user_id).copied();
        let total = previous.unwrap_or(0).saturating_add(amount);
        cache.insert(user_id, total);

        if let Err(e) = self.persist(&cache) {
            // Keep memory and disk in agreement when the write fails.
            match previous {
                Some(old) => cache.insert(user_id, old),
                None => cache.remove(&user_id),
            };
            return Err(e);
        }

        Ok(total)
    }

    async fn top_spenders(&self, limit: usize) -> Result<Vec<SpenderTotal>, LedgerError> {
        let cache = self.cache.read().await;
        // BTreeMap iterates by user id and sort_by is stable, so ties stay in id order.
        let mut spenders: Vec<SpenderTotal> = cache
            .iter()
            .map(|(&user_id, &total)| SpenderTotal { user_id, total })
            .collect();
        spenders.sort_by(|a, b| b.total.cmp(&a.total));
        spenders.truncate(limit);
        Ok(spenders)
    }
}
