//! File-backed state: the ledger, the transaction log and ledger snapshots

pub mod audit;
pub mod backups;
pub mod ledger;
pub mod restore;

pub use audit::{AuditLog, TokenSummary};
pub use backups::{BackupInfo, BackupManager};
pub use ledger::LedgerStore;
pub use restore::PendingRestores;
