pub mod amount_parser;
pub mod rank_reconciler;
pub mod rank_table;
pub mod spending_service;

pub use rank_table::RankTable;
pub use spending_service::{LedgerError, LedgerStore, SpenderTotal, SpendingError, SpendingService};
