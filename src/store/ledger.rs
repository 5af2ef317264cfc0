use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::models::BalanceTable;

/// Ledger file handle
///
/// The table is loaded from disk on every operation and rewritten whole on
/// every mutation. Callers that read-modify-write hold [`LedgerStore::lock`]
/// for the whole sequence so updates within this process are not lost.
#[derive(Clone)]
pub struct LedgerStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize access to the ledger file within this process
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Read the persisted table
    ///
    /// A missing file is a fresh start. An unreadable or corrupt file is
    /// treated the same way, with a warning.
    pub async fn load(&self) -> BalanceTable {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BalanceTable::new(),
            Err(e) => {
                tracing::warn!("Error loading token data from {:?}: {}", self.path, e);
                return BalanceTable::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Error parsing token data from {:?}: {}", self.path, e);
                BalanceTable::new()
            }
        }
    }

    /// Overwrite the ledger file with `table`. Returns false on failure.
    pub async fn save(&self, table: &BalanceTable) -> bool {
        let bytes = match serde_json::to_vec(table) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Error serializing token data: {}", e);
                return false;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::error!("Failed to create ledger directory: {}", e);
                    return false;
                }
            }
        }

        match tokio::fs::write(&self.path, bytes).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error saving token data to {:?}: {}", self.path, e);
                false
            }
        }
    }
}
