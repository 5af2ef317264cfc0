use std::time::Duration;

use tokio::task::JoinHandle;

use crate::constants::{BACKUP_PREFIX, SYSTEM_GUILD};
use crate::models::{ActionTag, LogEntry};
use crate::AppState;

/// Take one scheduled snapshot and audit it under the system guild.
/// Returns the snapshot's file name.
pub async fn run_scheduled_backup(state: &AppState) -> Option<String> {
    let file_name = state.backups.create_backup().await?;
    let stamp = file_name
        .strip_prefix(BACKUP_PREFIX)
        .and_then(|rest| rest.strip_suffix(".json"))
        .unwrap_or(&file_name);

    state
        .audit
        .append_entry(LogEntry::now(SYSTEM_GUILD, ActionTag::AutoBackup).with_amount(stamp))
        .await;

    Some(file_name)
}

/// Snapshot the ledger now and then every `interval`
pub fn spawn_backup_loop(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            // The first tick completes immediately
            ticker.tick().await;
            match run_scheduled_backup(&state).await {
                Some(file_name) => tracing::info!("Scheduled backup created: {}", file_name),
                None => tracing::warn!("Scheduled backup skipped or failed"),
            }
        }
    })
}
