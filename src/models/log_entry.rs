use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};

use super::interaction::Member;
use crate::constants::LOG_TIMESTAMP_FORMAT;

/// Closed set of actions written to the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTag {
    GiveTokens,
    DepositTokens,
    RemoveTokens,
    CheckBalances,
    CheckPersonalBalance,
    CheckUserBalance,
    VerifyBalance,
    ResetAllTokens,
    ManualBackup,
    AutoBackup,
    ListBackups,
    RestoreBackup,
    AdminCheckUserTokens,
    BankHelpCommand,
    AutoRemoveLeftMember,
}

impl ActionTag {
    pub const ALL: [ActionTag; 15] = [
        ActionTag::GiveTokens,
        ActionTag::DepositTokens,
        ActionTag::RemoveTokens,
        ActionTag::CheckBalances,
        ActionTag::CheckPersonalBalance,
        ActionTag::CheckUserBalance,
        ActionTag::VerifyBalance,
        ActionTag::ResetAllTokens,
        ActionTag::ManualBackup,
        ActionTag::AutoBackup,
        ActionTag::ListBackups,
        ActionTag::RestoreBackup,
        ActionTag::AdminCheckUserTokens,
        ActionTag::BankHelpCommand,
        ActionTag::AutoRemoveLeftMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTag::GiveTokens => "GIVE_TOKENS",
            ActionTag::DepositTokens => "DEPOSIT_TOKENS",
            ActionTag::RemoveTokens => "REMOVE_TOKENS",
            ActionTag::CheckBalances => "CHECK_BALANCES",
            ActionTag::CheckPersonalBalance => "CHECK_PERSONAL_BALANCE",
            ActionTag::CheckUserBalance => "CHECK_USER_BALANCE",
            ActionTag::VerifyBalance => "VERIFY_BALANCE",
            ActionTag::ResetAllTokens => "RESET_ALL_TOKENS",
            ActionTag::ManualBackup => "MANUAL_BACKUP",
            ActionTag::AutoBackup => "AUTO_BACKUP",
            ActionTag::ListBackups => "LIST_BACKUPS",
            ActionTag::RestoreBackup => "RESTORE_BACKUP",
            ActionTag::AdminCheckUserTokens => "ADMIN_CHECK_USER_TOKENS",
            ActionTag::BankHelpCommand => "BANK_HELP_COMMAND",
            ActionTag::AutoRemoveLeftMember => "AUTO_REMOVE_LEFT_MEMBER",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("Unknown action tag: {}", s))
    }
}

const FIELD_SEPARATOR: &str = " | ";
const ADMIN_KEY: &str = "Admin: ";
const MEMBER_KEY: &str = "Member: ";
const AMOUNT_KEY: &str = "Amount: ";
const MEMBER_ID_KEY: &str = "MemberId: ";

/// One line of the transaction log
///
/// Rendered as
/// `[YYYY-MM-DD HH:MM:SS] [guild] ACTION | Admin: a | Member: m | Amount: n | MemberId: id`
/// where every `| ...` field is optional. `MemberId` always comes last so the
/// leading part of the line keeps the historical layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub guild_name: String,
    pub action: ActionTag,
    pub admin: Option<String>,
    pub member: Option<String>,
    pub amount: Option<String>,
    pub member_id: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Admin,
    Member,
    Amount,
    MemberId,
}

impl LogEntry {
    pub fn new(timestamp: NaiveDateTime, guild_name: impl Into<String>, action: ActionTag) -> Self {
        Self {
            timestamp,
            guild_name: guild_name.into(),
            action,
            admin: None,
            member: None,
            amount: None,
            member_id: None,
        }
    }

    /// Entry stamped with the current local time
    pub fn now(guild_name: impl Into<String>, action: ActionTag) -> Self {
        Self::new(Local::now().naive_local(), guild_name, action)
    }

    pub fn with_admin(mut self, admin: &Member) -> Self {
        self.admin = Some(admin.log_name());
        self
    }

    /// Record `member` by name and by id
    pub fn with_member(mut self, member: &Member) -> Self {
        self.member = Some(member.log_name());
        self.member_id = Some(member.id.clone());
        self
    }

    /// Free-text member field without a structured id
    pub fn with_member_text(mut self, text: impl Into<String>) -> Self {
        self.member = Some(text.into());
        self
    }

    pub fn with_amount(mut self, amount: impl fmt::Display) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    /// Numeric amount, if the amount field starts with an integer
    pub fn amount_value(&self) -> Option<i64> {
        self.amount
            .as_deref()?
            .split_whitespace()
            .next()?
            .parse()
            .ok()
    }

    /// Parse one log line. Returns `None` for lines that do not follow the
    /// log layout or carry an unknown action.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let rest = line.strip_prefix('[')?;
        let (ts, rest) = rest.split_once("] [")?;
        let timestamp = NaiveDateTime::parse_from_str(ts, LOG_TIMESTAMP_FORMAT).ok()?;

        // Guild names are free text and may contain "] ", so take the first
        // split point that is followed by a known action tag.
        let (guild_name, action, fields) = rest.match_indices("] ").find_map(|(idx, _)| {
            let after = &rest[idx + 2..];
            let (tag, fields) = match after.split_once(FIELD_SEPARATOR) {
                Some((tag, fields)) => (tag, Some(fields)),
                None => (after, None),
            };
            let action = tag.trim_end().parse::<ActionTag>().ok()?;
            Some((&rest[..idx], action, fields))
        })?;

        let mut entry = LogEntry::new(timestamp, guild_name, action);
        let mut last: Option<Field> = None;
        for segment in fields.into_iter().flat_map(|f| f.split(FIELD_SEPARATOR)) {
            let (field, value) = if let Some(v) = segment.strip_prefix(ADMIN_KEY) {
                (Field::Admin, v)
            } else if let Some(v) = segment.strip_prefix(MEMBER_KEY) {
                (Field::Member, v)
            } else if let Some(v) = segment.strip_prefix(AMOUNT_KEY) {
                (Field::Amount, v)
            } else if let Some(v) = segment.strip_prefix(MEMBER_ID_KEY) {
                (Field::MemberId, v)
            } else {
                // A display name containing the separator: glue it back on.
                if let Some(field) = last {
                    if let Some(value) = entry.slot(field) {
                        value.push_str(FIELD_SEPARATOR);
                        value.push_str(segment);
                    }
                }
                continue;
            };
            *entry.slot_mut(field) = Some(value.to_string());
            last = Some(field);
        }

        Some(entry)
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Admin => &mut self.admin,
            Field::Member => &mut self.member,
            Field::Amount => &mut self.amount,
            Field::MemberId => &mut self.member_id,
        }
    }

    fn slot(&mut self, field: Field) -> Option<&mut String> {
        self.slot_mut(field).as_mut()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.guild_name,
            self.action
        )?;
        if let Some(admin) = &self.admin {
            write!(f, "{}{}{}", FIELD_SEPARATOR, ADMIN_KEY, admin)?;
        }
        if let Some(member) = &self.member {
            write!(f, "{}{}{}", FIELD_SEPARATOR, MEMBER_KEY, member)?;
        }
        if let Some(amount) = &self.amount {
            write!(f, "{}{}{}", FIELD_SEPARATOR, AMOUNT_KEY, amount)?;
        }
        if let Some(id) = &self.member_id {
            write!(f, "{}{}{}", FIELD_SEPARATOR, MEMBER_ID_KEY, id)?;
        }
        Ok(())
    }
}
