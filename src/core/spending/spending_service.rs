// This is the spending module - it contains ALL the business logic for GP ranks.
// Like the rest of core/, it has NO Discord-specific code. It works with u64 ids
// and talks to the outside world only through the LedgerStore and
// DirectoryClient traits.

use super::amount_parser::{parse_amount, AmountError};
use super::rank_reconciler::{reconcile, RoleDelta};
use super::rank_table::{Rank, RankTable};
use crate::core::directory::{DirectoryClient, DirectoryError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One line of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpenderTotal {
    pub user_id: u64,
    pub total: u64,
}

/// What happened to the member's rank roles after a spend was logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankSync {
    /// Total is below every tier; roles were left alone.
    Unranked,
    /// Directory already matched the earned rank.
    Unchanged,
    /// Rank role granted and/or other rank roles revoked.
    Updated {
        granted: Option<String>,
        revoked: Vec<String>,
    },
    /// The earned rank has no matching guild role yet, so nothing was changed.
    MissingRole(String),
}

/// Returned to the command layer after `/spent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendReceipt {
    pub user_id: u64,
    pub amount: u64,
    pub new_total: u64,
    pub rank: Option<String>,
    pub rank_sync: RankSync,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Spend amount must be positive")]
    NonPositiveAmount,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[derive(Debug, Error)]
pub enum SpendingError {
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The spend was persisted but the role update failed. The next spend for
    /// this member will reconcile their roles again.
    #[error("Recorded {new_total} GP but failed to update roles: {source}")]
    Directory {
        new_total: u64,
        #[source]
        source: DirectoryError,
    },

    #[error("This command only works in servers")]
    NotInGuild,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Durable mapping of user id -> cumulative GP spent.
///
/// Entries are created on the first spend and never removed or decremented.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current total, or 0 for users who never spent.
    async fn total_for(&self, user_id: u64) -> Result<u64, LedgerError>;

    /// Add `amount` to the user's total and persist before returning the new total.
    async fn add_spend(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError>;

    /// Up to `limit` spenders, highest total first, ties by ascending user id.
    async fn top_spenders(&self, limit: usize) -> Result<Vec<SpenderTotal>, LedgerError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Records spending and keeps rank roles in line with the ledger.
///
/// Spends for the same user are serialized: the per-user lock is held from the
/// ledger write until the roles are reconciled, so two `/spent` calls for one
/// member can never interleave their read-modify-write or role updates.
pub struct SpendingService<S: LedgerStore, D: DirectoryClient> {
    store: S,
    directory: D,
    ranks: RankTable,
    user_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<S: LedgerStore, D: DirectoryClient> SpendingService<S, D> {
    pub fn new(store: S, directory: D, ranks: RankTable) -> Self {
        Self {
            store,
            directory,
            ranks,
            user_locks: DashMap::new(),
        }
    }

    pub fn rank_for(&self, total: u64) -> Option<&Rank> {
        self.ranks.rank_for(total)
    }

    fn lock_for(&self, user_id: u64) -> Arc<Mutex<()>> {
        Arc::clone(self.user_locks.entry(user_id).or_default().value())
    }

    /// Parse `amount_text`, add it to the member's total and update their rank role.
    ///
    /// **Returns:**
    /// - `Ok(SpendReceipt)` once the total is persisted and roles reconciled
    /// - `Err(InvalidAmount)` / `Err(Ledger(NonPositiveAmount))` with no state touched
    /// - `Err(Directory { .. })` if the total was saved but the role calls failed
    pub async fn log_spend(
        &self,
        guild_id: Option<u64>,
        user_id: u64,
        amount_text: &str,
    ) -> Result<SpendReceipt, SpendingError> {
        let guild_id = guild_id.ok_or(SpendingError::NotInGuild)?;
        let amount = parse_amount(amount_text)?;
        self.record_spend(guild_id, user_id, amount).await
    }

    /// Add an already-parsed amount to the member's total and update their rank role.
    pub async fn record_spend(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
    ) -> Result<SpendReceipt, SpendingError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount.into());
        }

        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_spend(guild_id, user_id, amount).await
        };
        drop(lock);
        // Nobody else is waiting on this member once only the map holds the lock.
        self.user_locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Ledger write plus rank sync; caller holds the member's lock.
    async fn apply_spend(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
    ) -> Result<SpendReceipt, SpendingError> {
        let new_total = self.store.add_spend(user_id, amount).await?;
        tracing::info!(user_id, guild_id, amount, total = new_total, "Spend recorded");

        let rank_sync = self
            .sync_rank(guild_id, user_id, new_total)
            .await
            .map_err(|source| {
                tracing::error!(
                    user_id,
                    guild_id,
                    total = new_total,
                    "Failed to update rank roles: {}",
                    source
                );
                SpendingError::Directory { new_total, source }
            })?;

        Ok(SpendReceipt {
            user_id,
            amount,
            new_total,
            rank: self.rank_for(new_total).map(|r| r.name.clone()),
            rank_sync,
        })
    }

    /// Converge the member's rank roles on the rank earned by `total`.
    ///
    /// Grants before revoking, so a member is never briefly without any rank.
    async fn sync_rank(
        &self,
        guild_id: u64,
        user_id: u64,
        total: u64,
    ) -> Result<RankSync, DirectoryError> {
        let Some(target) = self.ranks.rank_for(total) else {
            return Ok(RankSync::Unranked);
        };

        let Some(target_role) = self
            .directory
            .find_role_by_name(guild_id, &target.name)
            .await?
        else {
            tracing::warn!(guild_id, role = %target.name, "Rank role does not exist in guild, skipping");
            return Ok(RankSync::MissingRole(target.name.clone()));
        };

        let held = self.directory.current_roles(guild_id, user_id).await?;
        let held_names: Vec<&str> = held.iter().map(|r| r.name.as_str()).collect();
        let delta = reconcile(&self.ranks, total, held_names.as_slice());
        if delta.is_empty() {
            return Ok(RankSync::Unchanged);
        }
        let RoleDelta { to_add, to_remove } = delta;

        if to_add.is_some() {
            self.directory
                .grant_role(guild_id, user_id, target_role.id)
                .await?;
        }

        for name in &to_remove {
            if let Some(role) = held.iter().find(|r| &r.name == name) {
                self.directory.revoke_role(guild_id, user_id, role.id).await?;
            }
        }

        tracing::info!(
            user_id,
            guild_id,
            role = %target.name,
            revoked = ?to_remove,
            "Rank roles updated"
        );

        Ok(RankSync::Updated {
            granted: to_add,
            revoked: to_remove,
        })
    }

    /// Read-only lookup of a member's total.
    pub async fn total_for(&self, user_id: u64) -> Result<u64, SpendingError> {
        Ok(self.store.total_for(user_id).await?)
    }

    /// Top spenders. Only members with at least one logged spend appear.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<SpenderTotal>, SpendingError> {
        Ok(self.store.top_spenders(limit).await?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory::fake::{Call, FakeDirectory};
    use crate::infra::spending::InMemoryLedgerStore;

    const GUILD: u64 = 1;

    fn all_ranks() -> Vec<&'static str> {
        vec![
            "Relic",
            "Eternal",
            "Zenyte",
            "Onyx",
            "Dragonstone",
            "Diamond",
            "Ruby",
            "Emerald",
            "Sapphire",
            "Giveaways",
        ]
    }

    fn make_service(
        directory: FakeDirectory,
    ) -> SpendingService<InMemoryLedgerStore, FakeDirectory> {
        SpendingService::new(InMemoryLedgerStore::new(), directory, RankTable::gp_tiers())
    }

    #[tokio::test]
    async fn first_spend_grants_emerald() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        let receipt = service.log_spend(Some(GUILD), 7, "100m").await.unwrap();

        assert_eq!(receipt.new_total, 100_000_000);
        assert_eq!(receipt.rank.as_deref(), Some("Emerald"));
        assert_eq!(
            receipt.rank_sync,
            RankSync::Updated {
                granted: Some("Emerald".into()),
                revoked: vec![],
            }
        );
        assert_eq!(
            service.directory.calls(),
            vec![Call::Grant {
                user_id: 7,
                role: "Emerald".into()
            }]
        );
    }

    #[tokio::test]
    async fn promotion_grants_before_revoking() {
        let directory = FakeDirectory::with_roles(&all_ranks());
        directory.give(7, "Giveaways");
        let service = make_service(directory);

        service.log_spend(Some(GUILD), 7, "100m").await.unwrap();
        let receipt = service.log_spend(Some(GUILD), 7, "700m").await.unwrap();

        assert_eq!(receipt.new_total, 800_000_000);
        assert_eq!(receipt.rank.as_deref(), Some("Onyx"));
        assert_eq!(
            &service.directory.calls()[1..],
            &[
                Call::Grant {
                    user_id: 7,
                    role: "Onyx".into()
                },
                Call::Revoke {
                    user_id: 7,
                    role: "Emerald".into()
                },
            ]
        );
        assert_eq!(service.directory.role_names(7), vec!["Giveaways", "Onyx"]);
    }

    #[tokio::test]
    async fn repeat_spend_within_tier_makes_no_directory_calls() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        service.log_spend(Some(GUILD), 7, "100m").await.unwrap();
        let receipt = service.log_spend(Some(GUILD), 7, "1m").await.unwrap();

        assert_eq!(receipt.rank_sync, RankSync::Unchanged);
        assert_eq!(service.directory.calls().len(), 1);
    }

    #[tokio::test]
    async fn small_spend_leaves_roles_untouched() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        let receipt = service.log_spend(Some(GUILD), 7, "10k").await.unwrap();

        assert_eq!(receipt.rank, None);
        assert_eq!(receipt.rank_sync, RankSync::Unranked);
        assert!(service.directory.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_guild_role_is_skipped() {
        let service = make_service(FakeDirectory::with_roles(&["Sapphire"]));

        let receipt = service.log_spend(Some(GUILD), 7, "150m").await.unwrap();

        assert_eq!(receipt.new_total, 150_000_000);
        assert_eq!(receipt.rank_sync, RankSync::MissingRole("Emerald".into()));
        assert!(service.directory.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_amount_changes_nothing() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        let err = service.log_spend(Some(GUILD), 7, "lots").await.unwrap_err();

        assert!(matches!(err, SpendingError::InvalidAmount(_)));
        assert_eq!(service.total_for(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_spend_is_rejected() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        let err = service.log_spend(Some(GUILD), 7, "0").await.unwrap_err();

        assert!(matches!(
            err,
            SpendingError::Ledger(LedgerError::NonPositiveAmount)
        ));
        assert!(service.leaderboard(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn spend_outside_guild_is_rejected() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));

        let err = service.log_spend(None, 7, "5m").await.unwrap_err();

        assert!(matches!(err, SpendingError::NotInGuild));
        assert_eq!(service.total_for(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn directory_failure_keeps_recorded_total() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()).failing());

        let err = service.log_spend(Some(GUILD), 7, "1b").await.unwrap_err();

        match err {
            SpendingError::Directory { new_total, .. } => assert_eq!(new_total, 1_000_000_000),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.total_for(7).await.unwrap(), 1_000_000_000);
    }

    #[tokio::test]
    async fn concurrent_spends_for_one_user_are_not_lost() {
        let service = Arc::new(make_service(FakeDirectory::with_roles(&all_ranks())));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.record_spend(GUILD, 9, 10_000_000).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.total_for(9).await.unwrap(), 200_000_000);
        assert_eq!(service.directory.role_names(9), vec!["Ruby"]);
        assert!(service.user_locks.is_empty());
    }

    #[tokio::test]
    async fn member_locks_are_released_after_each_spend() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()).failing());

        service.record_spend(GUILD, 1, 5).await.unwrap();
        assert!(service.user_locks.is_empty());

        service.record_spend(GUILD, 2, 1_000_000_000).await.unwrap_err();
        assert!(service.user_locks.is_empty());
    }

    #[tokio::test]
    async fn absent_member_is_reported_without_role_changes() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()).without_member(7));

        let err = service.log_spend(Some(GUILD), 7, "100m").await.unwrap_err();

        assert!(matches!(
            err,
            SpendingError::Directory {
                new_total: 100_000_000,
                source: DirectoryError::UnknownMember {
                    guild_id: GUILD,
                    user_id: 7
                },
            }
        ));
        assert!(service.directory.calls().is_empty());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_total() {
        let service = make_service(FakeDirectory::with_roles(&all_ranks()));
        service.record_spend(GUILD, 1, 500_000_000).await.unwrap();
        service.record_spend(GUILD, 2, 2_000_000_000).await.unwrap();
        service.record_spend(GUILD, 3, 1).await.unwrap();

        let board = service.leaderboard(10).await.unwrap();
        let order: Vec<u64> = board.iter().map(|s| s.user_id).collect();

        assert_eq!(order, vec![2, 1, 3]);
    }
}
