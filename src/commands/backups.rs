use super::Context;
use crate::constants::LOG_TIMESTAMP_FORMAT;
use crate::error::{AppError, Result};
use crate::models::{ActionTag, LogEntry, Reply};
use crate::store::BackupInfo;

/// `/create_backup`: snapshot the ledger now
pub async fn create_backup(ctx: &Context<'_>) -> Result<Reply> {
    let state = ctx.state;
    let Some(file_name) = state.backups.create_backup().await else {
        return Err(AppError::Persistence(
            "Failed to create backup. Check server logs for details.".to_string(),
        ));
    };

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::ManualBackup,
            Some(ctx.caller),
            None,
            None,
        )
        .await;

    Ok(Reply::ephemeral(format!("Backup created successfully: {}", file_name)))
}

/// `/list_backups`: numbered snapshots, newest first
pub async fn list_backups(ctx: &Context<'_>) -> Result<Reply> {
    let state = ctx.state;
    let backups = state.backups.list_backups().await;
    if backups.is_empty() {
        return Ok(Reply::ephemeral("No backups available."));
    }

    let mut reply = Reply::ephemeral("Use `/restore_backup <number>` to restore a specific backup.")
        .with_title("Available Backups");
    for (i, backup) in backups.iter().enumerate() {
        reply = reply.field(
            format!("{}. {}", i + 1, backup.file_name),
            format!(
                "Created: {}\nSize: {:.2} KB",
                backup.created.format(LOG_TIMESTAMP_FORMAT),
                backup.size_bytes as f64 / 1024.0
            ),
        );
    }

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::ListBackups,
            Some(ctx.caller),
            None,
            None,
        )
        .await;

    Ok(reply)
}

/// Resolve a 1-based index from `/list_backups` against the current listing
fn backup_at(backups: &[BackupInfo], index: i64) -> Result<&BackupInfo> {
    if backups.is_empty() {
        return Err(AppError::NoBackups);
    }
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| backups.get(i))
        .ok_or(AppError::BackupNotFound {
            available: backups.len(),
        })
}

/// `/restore_backup`: ask for confirmation before overwriting the ledger
pub async fn restore_backup(ctx: &Context<'_>, index: i64) -> Result<Reply> {
    let state = ctx.state;
    let backups = state.backups.list_backups().await;
    let backup = backup_at(&backups, index)?;

    state
        .restores
        .request(&ctx.guild.id, &ctx.caller.id, index, &backup.file_name)
        .await;

    Ok(Reply::ephemeral(format!(
        "Are you sure you want to restore from backup: {}?\n\
         This will overwrite the current token data. Run `/confirm_restore {}` within {} seconds to proceed.",
        backup.file_name,
        index,
        state.config.restore_confirm_ttl_secs
    )))
}

/// `/confirm_restore`: apply a restore requested by the same admin
pub async fn confirm_restore(ctx: &Context<'_>, index: i64) -> Result<Reply> {
    let state = ctx.state;
    let backups = state.backups.list_backups().await;
    let backup = backup_at(&backups, index)?;

    let requested = state
        .restores
        .confirm(&ctx.guild.id, &ctx.caller.id, index)
        .await?;
    if requested != backup.file_name {
        tracing::warn!(
            "Backup {} moved from {} to {} before confirmation",
            index,
            requested,
            backup.file_name
        );
        return Err(AppError::RestoreChanged);
    }

    if !state.backups.restore(&backup.file_name).await {
        return Err(AppError::Persistence(
            "Failed to restore from backup. Check server logs for details.".to_string(),
        ));
    }

    state
        .audit
        .append_entry(
            LogEntry::now(&ctx.guild.name, ActionTag::RestoreBackup)
                .with_admin(ctx.caller)
                .with_amount(&backup.file_name),
        )
        .await;

    tracing::warn!("Ledger restored from {} by {}", backup.file_name, ctx.caller.id);

    Ok(Reply::ephemeral(format!(
        "Successfully restored token data from backup: {}",
        backup.file_name
    )))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::commands::execute;
    use crate::commands::test_support::*;
    use crate::error::AppError;
    use crate::models::{Command, Member};
    use crate::AppState;

    async fn give(state: &AppState, member: &Member, amount: i64) {
        let command = Command::Give {
            member: member.clone(),
            amount,
        };
        execute(state, &interaction(admin(), command)).await.unwrap();
    }

    async fn snapshot(state: &AppState, second: u32) -> String {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, second)
            .unwrap();
        state.backups.create_backup_at(at).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_backup_without_ledger_fails() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let result = execute(&state, &interaction(admin(), Command::CreateBackup)).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert!(log_lines(&state).is_empty());
    }

    #[tokio::test]
    async fn test_create_and_list_backups() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let reply = execute(&state, &interaction(admin(), Command::ListBackups))
            .await
            .unwrap();
        assert_eq!(reply.content, "No backups available.");

        give(&state, &user("2", "alice"), 1).await;
        let reply = execute(&state, &interaction(admin(), Command::CreateBackup))
            .await
            .unwrap();
        assert!(reply.content.contains("token_data_backup_"));

        let reply = execute(&state, &interaction(admin(), Command::ListBackups))
            .await
            .unwrap();
        assert_eq!(reply.fields.len(), 1);
        assert!(reply.fields[0].name.starts_with("1. token_data_backup_"));
        assert!(reply.fields[0].value.contains("KB"));

        let lines = log_lines(&state);
        assert!(lines[1].contains("MANUAL_BACKUP | Admin: boss"));
        assert!(lines[2].contains("LIST_BACKUPS | Admin: boss"));
    }

    #[tokio::test]
    async fn test_restore_requires_confirmation() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let alice = user("2", "alice");

        give(&state, &alice, 1).await;
        let file = snapshot(&state, 0).await;
        give(&state, &alice, 2).await;

        // Confirming without a request does nothing
        let confirm = Command::ConfirmRestore { index: 1 };
        assert!(matches!(
            execute(&state, &interaction(admin(), confirm.clone())).await,
            Err(AppError::NoPendingRestore { index: 1 })
        ));
        assert_eq!(state.ledger.load().await.balance(GUILD_ID, "2"), 3);

        let request = Command::RestoreBackup { index: 1 };
        let reply = execute(&state, &interaction(admin(), request)).await.unwrap();
        assert!(reply.content.contains(&file));

        // Another admin cannot confirm someone else's request
        let mut other = admin();
        other.id = "9".to_string();
        assert!(execute(&state, &interaction(other, confirm.clone())).await.is_err());

        let reply = execute(&state, &interaction(admin(), confirm)).await.unwrap();
        assert!(reply.content.contains(&file));
        assert_eq!(state.ledger.load().await.balance(GUILD_ID, "2"), 1);

        let lines = log_lines(&state);
        assert!(lines
            .last()
            .unwrap()
            .ends_with(&format!("RESTORE_BACKUP | Admin: boss | Amount: {}", file)));
    }

    #[tokio::test]
    async fn test_restore_index_validation() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let request = Command::RestoreBackup { index: 1 };
        assert!(matches!(
            execute(&state, &interaction(admin(), request)).await,
            Err(AppError::NoBackups)
        ));

        give(&state, &user("2", "alice"), 1).await;
        snapshot(&state, 0).await;
        snapshot(&state, 1).await;

        for index in [0, 3, -1] {
            let request = Command::RestoreBackup { index };
            assert!(matches!(
                execute(&state, &interaction(admin(), request)).await,
                Err(AppError::BackupNotFound { available: 2 })
            ));
        }
    }

    #[tokio::test]
    async fn test_confirm_rejected_when_listing_shifts() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        give(&state, &user("2", "alice"), 1).await;
        snapshot(&state, 0).await;

        let request = Command::RestoreBackup { index: 1 };
        execute(&state, &interaction(admin(), request)).await.unwrap();

        // A newer snapshot takes position 1
        snapshot(&state, 30).await;

        let confirm = Command::ConfirmRestore { index: 1 };
        assert!(matches!(
            execute(&state, &interaction(admin(), confirm)).await,
            Err(AppError::RestoreChanged)
        ));
    }
}
