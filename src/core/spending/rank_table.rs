// Rank tiers keyed by cumulative GP spent.
//
// The table is static configuration. Lookup is a linear scan because there are
// only a handful of tiers.

use thiserror::Error;

/// A named tier and the minimum cumulative amount that qualifies for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    pub name: String,
    pub threshold: u64,
}

impl Rank {
    pub fn new(name: impl Into<String>, threshold: u64) -> Self {
        Self {
            name: name.into(),
            threshold,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankTableError {
    #[error("Rank names must not be empty")]
    EmptyName,

    #[error("Rank {0:?} is listed more than once")]
    DuplicateName(String),

    #[error("Rank {name:?} ({threshold}) must be below the previous threshold {previous}")]
    NotDescending {
        name: String,
        threshold: u64,
        previous: u64,
    },
}

/// Ordered list of ranks, highest threshold first.
#[derive(Debug, Clone)]
pub struct RankTable {
    ranks: Vec<Rank>,
}

impl RankTable {
    /// Build a table, checking that thresholds strictly decrease in the given order.
    #[allow(dead_code)]
    pub fn new(ranks: Vec<Rank>) -> Result<Self, RankTableError> {
        for (i, rank) in ranks.iter().enumerate() {
            if rank.name.trim().is_empty() {
                return Err(RankTableError::EmptyName);
            }
            if ranks[..i].iter().any(|r| r.name == rank.name) {
                return Err(RankTableError::DuplicateName(rank.name.clone()));
            }
            if let Some(previous) = i.checked_sub(1).map(|p| &ranks[p]) {
                if rank.threshold >= previous.threshold {
                    return Err(RankTableError::NotDescending {
                        name: rank.name.clone(),
                        threshold: rank.threshold,
                        previous: previous.threshold,
                    });
                }
            }
        }

        Ok(Self { ranks })
    }

    /// The OSRS gem tiers the server uses.
    pub fn gp_tiers() -> Self {
        Self {
            ranks: vec![
                Rank::new("Relic", 10_000_000_000),
                Rank::new("Eternal", 5_000_000_000),
                Rank::new("Zenyte", 1_000_000_000),
                Rank::new("Onyx", 800_000_000),
                Rank::new("Dragonstone", 600_000_000),
                Rank::new("Diamond", 400_000_000),
                Rank::new("Ruby", 200_000_000),
                Rank::new("Emerald", 100_000_000),
                Rank::new("Sapphire", 50_000_000),
            ],
        }
    }

    /// Highest rank whose threshold is at or below `amount`.
    pub fn rank_for(&self, amount: u64) -> Option<&Rank> {
        self.ranks.iter().find(|rank| rank.threshold <= amount)
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self::gp_tiers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_for(table: &RankTable, amount: u64) -> Option<&str> {
        table.rank_for(amount).map(|r| r.name.as_str())
    }

    #[test]
    fn gp_tiers_satisfy_ordering() {
        let tiers = RankTable::gp_tiers();
        assert!(RankTable::new(tiers.ranks().to_vec()).is_ok());
    }

    #[test]
    fn picks_highest_qualifying_rank() {
        let table = RankTable::gp_tiers();

        assert_eq!(name_for(&table, 0), None);
        assert_eq!(name_for(&table, 49_999_999), None);
        assert_eq!(name_for(&table, 50_000_000), Some("Sapphire"));
        assert_eq!(name_for(&table, 100_000_000), Some("Emerald"));
        assert_eq!(name_for(&table, 800_000_000), Some("Onyx"));
        assert_eq!(name_for(&table, 999_999_999), Some("Onyx"));
        assert_eq!(name_for(&table, u64::MAX), Some("Relic"));
    }

    #[test]
    fn empty_table_has_no_rank() {
        let table = RankTable::new(Vec::new()).unwrap();
        assert_eq!(table.rank_for(u64::MAX), None);
    }

    #[test]
    fn rank_lookup_is_monotonic() {
        let table = RankTable::gp_tiers();
        let threshold_of = |amount| table.rank_for(amount).map(|r| r.threshold);

        let mut samples: Vec<u64> = table
            .ranks()
            .iter()
            .flat_map(|r| [r.threshold.saturating_sub(1), r.threshold, r.threshold + 1])
            .collect();
        samples.extend([0, 1, u64::MAX]);
        samples.sort_unstable();

        for pair in samples.windows(2) {
            assert!(threshold_of(pair[0]) <= threshold_of(pair[1]));
        }
    }

    #[test]
    fn rejects_non_descending_thresholds() {
        let err = RankTable::new(vec![Rank::new("Low", 10), Rank::new("High", 20)]).unwrap_err();
        assert_eq!(
            err,
            RankTableError::NotDescending {
                name: "High".into(),
                threshold: 20,
                previous: 10,
            }
        );

        let equal = RankTable::new(vec![Rank::new("A", 10), Rank::new("B", 10)]);
        assert!(equal.is_err());
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        assert_eq!(
            RankTable::new(vec![Rank::new("A", 20), Rank::new("A", 10)]).unwrap_err(),
            RankTableError::DuplicateName("A".into())
        );
        assert_eq!(
            RankTable::new(vec![Rank::new("  ", 10)]).unwrap_err(),
            RankTableError::EmptyName
        );
    }
}
