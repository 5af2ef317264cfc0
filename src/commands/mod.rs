//! Slash command handlers
//!
//! Every handler follows the same order: authorize, validate input, take
//! the ledger lock when mutating, load, mutate, save, then audit. Audit
//! failures never change the reply.

pub mod backups;
pub mod balances;
pub mod help;
pub mod log;
pub mod tokens;

use crate::error::{AppError, Result};
use crate::models::{Command, Guild, Interaction, Member, Reply};
use crate::AppState;

/// Who is asking, and where
pub struct Context<'a> {
    pub state: &'a AppState,
    pub guild: &'a Guild,
    pub caller: &'a Member,
}

impl Context<'_> {
    pub fn is_admin(&self) -> bool {
        self.caller.has_role(&self.state.config.admin_role_name)
    }
}

/// Run one interaction and render its reply
pub async fn execute(state: &AppState, interaction: &Interaction) -> Result<Reply> {
    let ctx = Context {
        state,
        guild: &interaction.guild,
        caller: &interaction.caller,
    };
    let command = &interaction.command;

    tracing::debug!(
        "Command {} from {} in {}",
        command.name(),
        ctx.caller.id,
        ctx.guild.id
    );

    if command.admin_only() && !ctx.is_admin() {
        tracing::warn!(
            "Non-admin {} attempted /{} in {}",
            ctx.caller.id,
            command.name(),
            ctx.guild.id
        );
        return Err(AppError::Unauthorized);
    }

    match command {
        Command::Give { member, amount } => tokens::give(&ctx, member, *amount).await,
        Command::Remove { member, amount } => tokens::remove(&ctx, member, *amount).await,
        Command::Deposit { amount } => tokens::deposit(&ctx, *amount).await,
        Command::ResetAllTokens => tokens::reset_all(&ctx).await,
        Command::Balance => balances::balance(&ctx).await,
        Command::Balances => balances::balances(&ctx).await,
        Command::CheckUserBalance { member } => balances::check_user_balance(&ctx, member).await,
        Command::VerifyBalance { user1, user2 } => balances::verify_balance(&ctx, user1, user2).await,
        Command::UserTokens { member, history } => balances::user_tokens(&ctx, member, *history).await,
        Command::Stats => balances::stats(&ctx).await,
        Command::Log { entries } => log::view_log(&ctx, *entries).await,
        Command::CreateBackup => backups::create_backup(&ctx).await,
        Command::ListBackups => backups::list_backups(&ctx).await,
        Command::RestoreBackup { index } => backups::restore_backup(&ctx, *index).await,
        Command::ConfirmRestore { index } => backups::confirm_restore(&ctx, *index).await,
        Command::BankHelp => help::bank_help(&ctx).await,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_admin_command_rejected_before_any_io() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let alice = user("2", "alice");

        let result = execute(
            &state,
            &interaction(
                alice.clone(),
                Command::Give {
                    member: alice,
                    amount: 1,
                },
            ),
        )
        .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(!state.ledger.path().exists());
        assert!(!state.audit.path().exists());
    }

    #[tokio::test]
    async fn test_custom_admin_role() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = test_state(&temp_dir);
        state.config.admin_role_name = "Banker".to_string();

        let result = execute(&state, &interaction(admin(), Command::Stats)).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let mut banker = user("3", "banker");
        banker.roles.push("Banker".to_string());
        assert!(execute(&state, &interaction(banker, Command::Stats)).await.is_ok());
    }
}
