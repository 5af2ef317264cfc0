use serde::{Deserialize, Serialize};

use super::balance::mention;

/// Guild (server) an interaction happened in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

/// A guild member as resolved by the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Account name, as written to the transaction log
    pub name: String,
    /// Legacy four-digit discriminator, "0" or absent on migrated accounts
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Name recorded in log lines: `name` or `name#discriminator`
    pub fn log_name(&self) -> String {
        match self.discriminator.as_deref() {
            Some(disc) if !disc.is_empty() && disc != "0" => format!("{}#{}", self.name, disc),
            _ => self.name.clone(),
        }
    }

    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn mention(&self) -> String {
        mention(&self.id)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Slash commands understood by the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Command {
    Give {
        member: Member,
        amount: i64,
    },
    Remove {
        member: Member,
        amount: i64,
    },
    Deposit {
        amount: i64,
    },
    Balance,
    Balances,
    CheckUserBalance {
        member: Member,
    },
    VerifyBalance {
        user1: Member,
        user2: Member,
    },
    UserTokens {
        member: Member,
        #[serde(default)]
        history: bool,
    },
    Stats,
    ResetAllTokens,
    Log {
        #[serde(default)]
        entries: Option<i64>,
    },
    CreateBackup,
    ListBackups,
    RestoreBackup {
        index: i64,
    },
    ConfirmRestore {
        index: i64,
    },
    BankHelp,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Give { .. } => "give",
            Command::Remove { .. } => "remove",
            Command::Deposit { .. } => "deposit",
            Command::Balance => "balance",
            Command::Balances => "balances",
            Command::CheckUserBalance { .. } => "check_user_balance",
            Command::VerifyBalance { .. } => "verify_balance",
            Command::UserTokens { .. } => "user_tokens",
            Command::Stats => "stats",
            Command::ResetAllTokens => "reset_all_tokens",
            Command::Log { .. } => "log",
            Command::CreateBackup => "create_backup",
            Command::ListBackups => "list_backups",
            Command::RestoreBackup { .. } => "restore_backup",
            Command::ConfirmRestore { .. } => "confirm_restore",
            Command::BankHelp => "bank_help",
        }
    }

    /// Commands gated on the admin role
    pub fn admin_only(&self) -> bool {
        matches!(
            self,
            Command::Give { .. }
                | Command::Remove { .. }
                | Command::UserTokens { .. }
                | Command::Stats
                | Command::ResetAllTokens
                | Command::Log { .. }
                | Command::CreateBackup
                | Command::ListBackups
                | Command::RestoreBackup { .. }
                | Command::ConfirmRestore { .. }
        )
    }
}

/// One slash command invocation forwarded by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub guild: Guild,
    pub caller: Member,
    pub command: Command,
}

/// A member left a guild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRemoveEvent {
    pub guild: Guild,
    pub member: Member,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_name_discriminator() {
        let mut member = Member {
            id: "1".to_string(),
            name: "alice".to_string(),
            ..Default::default()
        };
        assert_eq!(member.log_name(), "alice");

        member.discriminator = Some("0".to_string());
        assert_eq!(member.log_name(), "alice");

        member.discriminator = Some("4242".to_string());
        assert_eq!(member.log_name(), "alice#4242");
    }

    #[test]
    fn test_display_falls_back_to_name() {
        let member = Member {
            id: "1".to_string(),
            name: "alice".to_string(),
            ..Default::default()
        };
        assert_eq!(member.display(), "alice");
        assert_eq!(member.mention(), "<@1>");
    }

    #[test]
    fn test_command_deserialization() {
        let json = r#"{"name":"give","member":{"id":"7","name":"bob"},"amount":2}"#;
        let command: Command = serde_json::from_str(json).unwrap();
        match command {
            Command::Give { member, amount } => {
                assert_eq!(member.id, "7");
                assert_eq!(amount, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let command: Command = serde_json::from_str(r#"{"name":"log"}"#).unwrap();
        assert!(matches!(command, Command::Log { entries: None }));

        let command: Command = serde_json::from_str(r#"{"name":"bank_help"}"#).unwrap();
        assert_eq!(command.name(), "bank_help");
    }
}
