use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use tokio::io::AsyncWriteExt;

use super::ledger::LedgerStore;
use crate::constants::{BACKUP_PREFIX, BACKUP_TIMESTAMP_FORMAT, PRE_RESTORE_PREFIX};
use crate::error::{AppError, Result};

/// A snapshot in the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub file_name: String,
    pub created: DateTime<Local>,
    pub size_bytes: u64,
}

/// Snapshots of the ledger file with bounded retention
#[derive(Clone)]
pub struct BackupManager {
    ledger: LedgerStore,
    dir: PathBuf,
    max_backups: usize,
}

/// Name of the rotated snapshot taken at `at`
pub fn backup_file_name(at: NaiveDateTime) -> String {
    format!("{}{}.json", BACKUP_PREFIX, at.format(BACKUP_TIMESTAMP_FORMAT))
}

impl BackupManager {
    pub fn new(ledger: LedgerStore, dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            ledger,
            dir: dir.into(),
            max_backups,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy the ledger file into a new timestamped snapshot.
    /// Returns the snapshot's file name, or `None` on failure.
    pub async fn create_backup(&self) -> Option<String> {
        self.create_backup_at(Local::now().naive_local()).await
    }

    /// Same as [`BackupManager::create_backup`] with an explicit timestamp.
    /// A second snapshot within the same second replaces the first.
    pub async fn create_backup_at(&self, at: NaiveDateTime) -> Option<String> {
        let result = {
            let _guard = self.ledger.lock().await;
            self.try_create(at).await
        };

        match result {
            Ok(file_name) => {
                tracing::info!("Created backup: {}", file_name);
                self.cleanup_old_backups().await;
                Some(file_name)
            }
            Err(e) => {
                tracing::error!("Backup failed: {}", e);
                None
            }
        }
    }

    async fn try_create(&self, at: NaiveDateTime) -> Result<String> {
        if !tokio::fs::try_exists(self.ledger.path()).await? {
            return Err(AppError::Persistence("Token file does not exist".to_string()));
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = backup_file_name(at);
        tokio::fs::copy(self.ledger.path(), self.dir.join(&file_name)).await?;
        Ok(file_name)
    }

    /// Rotated snapshots, newest first by creation time
    pub async fn list_backups(&self) -> Vec<BackupInfo> {
        match self.try_list().await {
            Ok(backups) => backups,
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::error!("Error listing backups: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_list(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(BACKUP_PREFIX) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let created: SystemTime = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            backups.push(BackupInfo {
                file_name,
                created: created.into(),
                size_bytes: metadata.len(),
            });
        }

        // Creation time first, name (itself a timestamp) breaks ties
        backups.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(backups)
    }

    /// Delete all but the newest `max_backups` snapshots
    pub async fn cleanup_old_backups(&self) {
        let backups = self.list_backups().await;
        for old in backups.iter().skip(self.max_backups) {
            match tokio::fs::remove_file(self.dir.join(&old.file_name)).await {
                Ok(()) => tracing::info!("Removed old backup: {}", old.file_name),
                Err(e) => tracing::error!("Error removing old backup {}: {}", old.file_name, e),
            }
        }
    }

    /// Replace the ledger file with the snapshot `file_name`
    ///
    /// The current ledger is first copied to a `pre_restore_backup_*` file
    /// that is never rotated. The snapshot is copied verbatim.
    pub async fn restore(&self, file_name: &str) -> bool {
        self.restore_at(file_name, Local::now().naive_local()).await
    }

    pub async fn restore_at(&self, file_name: &str, at: NaiveDateTime) -> bool {
        let _guard = self.ledger.lock().await;
        match self.try_restore(file_name, at).await {
            Ok(true) => {
                tracing::info!("Restored token data from backup: {}", file_name);
                true
            }
            Ok(false) => {
                tracing::warn!("Restore requested for missing backup: {}", file_name);
                false
            }
            Err(e) => {
                tracing::error!("Restore failed: {}", e);
                false
            }
        }
    }

    async fn try_restore(&self, file_name: &str, at: NaiveDateTime) -> Result<bool> {
        // Only plain names inside the backup directory
        if file_name.is_empty() || Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
            return Ok(false);
        }
        let source = self.dir.join(file_name);
        if !tokio::fs::try_exists(&source).await? {
            return Ok(false);
        }

        if tokio::fs::try_exists(self.ledger.path()).await? {
            let safety = self.write_safety_copy(at).await?;
            tracing::info!("Saved pre-restore copy: {:?}", safety);
        }

        tokio::fs::copy(&source, self.ledger.path()).await?;
        Ok(true)
    }

    /// Copy the live ledger to a fresh `pre_restore_backup_*` file.
    /// An existing safety copy is never overwritten: same-second restores
    /// get a `_1`, `_2`, ... suffix.
    async fn write_safety_copy(&self, at: NaiveDateTime) -> Result<PathBuf> {
        let contents = tokio::fs::read(self.ledger.path()).await?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let stamp = at.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut attempt: u32 = 0;
        loop {
            let name = match attempt {
                0 => format!("{}{}.json", PRE_RESTORE_PREFIX, stamp),
                n => format!("{}{}_{}.json", PRE_RESTORE_PREFIX, stamp, n),
            };
            let path = self.dir.join(name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(&contents).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
