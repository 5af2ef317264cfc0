use super::Context;
use crate::error::Result;
use crate::models::{ActionTag, Reply};

const USER_COMMANDS: &[(&str, &str)] = &[
    ("balance", "Check your token balance"),
    ("balances", "Check everyone's token balances"),
    ("bank_help", "List all available token bank commands"),
    ("check_user_balance", "Check another user's token balance"),
    ("deposit", "Deposit your tokens into the bank"),
    ("verify_balance", "Compare token balances between two users"),
];

const ADMIN_COMMANDS: &[(&str, &str)] = &[
    ("confirm_restore", "Confirm restoration from backup"),
    ("create_backup", "Manually create a backup of token data"),
    ("give", "Give tokens to a member"),
    ("list_backups", "List available token data backups"),
    ("log", "View recent token transactions"),
    ("remove", "Remove tokens from a member"),
    ("reset_all_tokens", "Reset all tokens in this server"),
    ("restore_backup", "Restore token data from a backup"),
    ("stats", "View server token statistics"),
    ("user_tokens", "Check a user's complete token history"),
];

fn render(commands: &[(&str, &str)]) -> String {
    commands
        .iter()
        .map(|(name, description)| format!("• `/{}` - {}", name, description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `/bank_help`: command overview, admin commands only shown to admins
pub async fn bank_help(ctx: &Context<'_>) -> Result<Reply> {
    let mut reply = Reply::public("Here are all the commands for the token bank system:")
        .with_title("Token Bank Commands")
        .field("User Commands", render(USER_COMMANDS));
    if ctx.is_admin() {
        reply = reply.field("Admin Commands", render(ADMIN_COMMANDS));
    }

    ctx.state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::BankHelpCommand,
            None,
            Some(ctx.caller),
            None,
        )
        .await;

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use crate::commands::execute;
    use crate::commands::test_support::*;
    use crate::models::Command;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_admin_section_only_for_admins() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let reply = execute(&state, &interaction(user("2", "alice"), Command::BankHelp))
            .await
            .unwrap();
        assert_eq!(reply.fields.len(), 1);
        assert!(reply.fields[0].value.contains("`/deposit`"));

        let reply = execute(&state, &interaction(admin(), Command::BankHelp))
            .await
            .unwrap();
        assert_eq!(reply.fields.len(), 2);
        assert!(reply.fields[1].value.contains("`/reset_all_tokens`"));

        let lines = log_lines(&state);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("BANK_HELP_COMMAND | Member: alice | MemberId: 2"));
    }
}
