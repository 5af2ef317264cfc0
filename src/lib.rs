//! Token Bank Bot
//!
//! Per-guild token ledger with an append-only audit log and rotating
//! backups, driven by slash commands forwarded from a chat gateway.

pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod store;
pub mod tasks;

pub use config::Config;
pub use error::{AppError, Result};

use store::{AuditLog, BackupManager, LedgerStore, PendingRestores};

/// Application state shared across all handlers and background tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ledger: LedgerStore,
    pub audit: AuditLog,
    pub backups: BackupManager,
    pub restores: PendingRestores,
}

impl AppState {
    /// Wire every store from the given configuration
    pub fn new(config: Config) -> Self {
        let ledger = LedgerStore::new(config.token_file.clone());
        let audit = AuditLog::new(config.log_file.clone(), config.default_log_entries);
        let backups = BackupManager::new(ledger.clone(), config.backup_dir.clone(), config.max_backups);
        let restores = PendingRestores::new(config.restore_confirm_ttl());

        Self {
            config,
            ledger,
            audit,
            backups,
            restores,
        }
    }
}
