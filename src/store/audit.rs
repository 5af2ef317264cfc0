use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::models::balance::mention;
use crate::models::{ActionTag, LogEntry, Member};

/// Token history of one member, rebuilt from the transaction log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenSummary {
    /// Tokens given minus tokens removed, never below zero
    pub total_given: i64,
    pub total_deposited: i64,
    /// Live balance from the ledger, not derived from the log
    pub current_balance: u32,
    pub net_tokens: i64,
    /// Always zero: removals are folded into `total_given`
    pub total_removed: i64,
}

impl TokenSummary {
    /// Share of net given tokens that were deposited, in percent
    pub fn usage_rate(&self) -> Option<f64> {
        (self.total_given > 0).then(|| self.total_deposited as f64 / self.total_given as f64 * 100.0)
    }
}

/// Append-only transaction log
#[derive(Clone)]
pub struct AuditLog {
    path: PathBuf,
    default_entries: usize,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>, default_entries: usize) -> Self {
        Self {
            path: path.into(),
            default_entries: default_entries.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry built from its parts
    pub async fn append(
        &self,
        guild_name: &str,
        action: ActionTag,
        admin: Option<&Member>,
        member: Option<&Member>,
        amount: Option<String>,
    ) -> Option<LogEntry> {
        let mut entry = LogEntry::now(guild_name, action);
        if let Some(admin) = admin {
            entry = entry.with_admin(admin);
        }
        if let Some(member) = member {
            entry = entry.with_member(member);
        }
        entry.amount = amount;
        self.append_entry(entry).await
    }

    /// Write `entry` as one line at the end of the log
    ///
    /// Failures are logged and reported as `None`. They never fail the
    /// operation being audited.
    pub async fn append_entry(&self, entry: LogEntry) -> Option<LogEntry> {
        let line = format!("{}\n", entry);
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        match result {
            Ok(()) => Some(entry),
            Err(e) => {
                tracing::error!("Error logging transaction to {:?}: {}", self.path, e);
                None
            }
        }
    }

    async fn read_lines(&self) -> Vec<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Error reading transaction log {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Up to `n` most recent lines; `n <= 0` falls back to the default page size
    pub async fn recent_entries(&self, n: i64) -> Vec<String> {
        let n = usize::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(self.default_entries);
        let mut lines = self.read_lines().await;
        let start = lines.len().saturating_sub(n);
        lines.drain(..start);
        lines
    }

    /// Lines naming `user_id` as member, oldest first, keeping the last `limit`
    pub async fn entries_mentioning(&self, user_id: &str, limit: usize) -> Vec<String> {
        let tagged = mention(user_id);
        let mut matches: Vec<String> = self
            .read_lines()
            .await
            .into_iter()
            .filter(|line| {
                LogEntry::parse(line).is_some_and(|entry| {
                    entry.member_id.as_deref() == Some(user_id)
                        || entry
                            .member
                            .as_deref()
                            .is_some_and(|m| m == user_id || m == tagged)
                })
            })
            .collect();

        let start = matches.len().saturating_sub(limit);
        matches.drain(..start);
        matches
    }

    /// Rebuild a member's token totals for one guild from the whole log
    pub async fn summarize(
        &self,
        guild_name: &str,
        user_id: &str,
        username: Option<&str>,
        current_balance: u32,
    ) -> TokenSummary {
        let tagged = mention(user_id);
        let names_user = |entry: &LogEntry| {
            if entry.member_id.as_deref() == Some(user_id) {
                return true;
            }
            let Some(member) = entry.member.as_deref() else {
                return false;
            };
            if member == user_id || member == tagged {
                return true;
            }
            username.is_some_and(|name| {
                member == name
                    || member
                        .strip_prefix(name)
                        .is_some_and(|rest| rest.starts_with('#'))
            })
        };

        let mut total_given: i64 = 0;
        let mut total_deposited: i64 = 0;

        for line in self.read_lines().await {
            let Some(entry) = LogEntry::parse(&line) else {
                continue;
            };
            if entry.guild_name != guild_name || !names_user(&entry) {
                continue;
            }
            let amount = entry.amount_value().unwrap_or(0);
            match entry.action {
                // Amounts are free text, so hand-edited lines may hold anything
                ActionTag::GiveTokens => total_given = total_given.saturating_add(amount),
                ActionTag::DepositTokens => total_deposited = total_deposited.saturating_add(amount),
                ActionTag::RemoveTokens => total_given = total_given.saturating_sub(amount).max(0),
                _ => {}
            }
        }

        TokenSummary {
            total_given,
            total_deposited,
            current_balance,
            net_tokens: total_given,
            total_removed: 0,
        }
    }
}
