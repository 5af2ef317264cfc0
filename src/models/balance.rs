use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Balances of one guild: user id -> tokens held
pub type GuildBalances = BTreeMap<String, u32>;

/// Every guild's balances, persisted as a single JSON object
///
/// Invariant: a user present in a guild map always holds at least one
/// token. Operations that bring a balance to zero delete the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceTable {
    guilds: BTreeMap<String, GuildBalances>,
}

/// Result of clearing one guild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub total_removed: u64,
    pub users_affected: usize,
}

/// Aggregate figures for one guild
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuildStats {
    pub total_tokens: u64,
    pub unique_users: usize,
    pub max_tokens: u32,
    pub average_tokens: f64,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, zero when the user holds nothing
    pub fn balance(&self, guild_id: &str, user_id: &str) -> u32 {
        self.guilds
            .get(guild_id)
            .and_then(|users| users.get(user_id))
            .copied()
            .unwrap_or(0)
    }

    /// Holders of a guild, ordered by user id
    pub fn holders(&self, guild_id: &str) -> Vec<(&str, u32)> {
        self.guilds
            .get(guild_id)
            .map(|users| users.iter().map(|(id, t)| (id.as_str(), *t)).collect())
            .unwrap_or_default()
    }

    /// Add tokens, rejecting when the result would exceed `max_per_user`.
    /// Returns the new balance.
    pub fn give(&mut self, guild_id: &str, user_id: &str, amount: u32, max_per_user: u32) -> Result<u32> {
        let current = self.balance(guild_id, user_id);
        let updated = current.saturating_add(amount);
        if updated > max_per_user {
            return Err(AppError::LimitExceeded {
                current,
                amount,
                max: max_per_user,
            });
        }
        if updated > 0 {
            self.guilds
                .entry(guild_id.to_string())
                .or_default()
                .insert(user_id.to_string(), updated);
        }
        Ok(updated)
    }

    /// Take tokens away from a user. Returns the remaining balance.
    pub fn remove(&mut self, guild_id: &str, user_id: &str, amount: u32) -> Result<u32> {
        let users = self
            .guilds
            .get_mut(guild_id)
            .filter(|users| users.contains_key(user_id))
            .ok_or_else(|| AppError::NoBalance {
                user: mention(user_id),
            })?;

        let current = users.get(user_id).copied().unwrap_or(0);
        if current < amount {
            return Err(AppError::InsufficientBalance {
                user: mention(user_id),
                current,
                requested: amount,
            });
        }

        let remaining = current - amount;
        if remaining == 0 {
            users.remove(user_id);
        } else {
            users.insert(user_id.to_string(), remaining);
        }
        Ok(remaining)
    }

    /// Move tokens out of the tracked balance into the bank.
    /// Same rules as [`BalanceTable::remove`].
    pub fn deposit(&mut self, guild_id: &str, user_id: &str, amount: u32) -> Result<u32> {
        self.remove(guild_id, user_id, amount)
    }

    /// Clear every balance of one guild
    pub fn reset_guild(&mut self, guild_id: &str) -> ResetOutcome {
        let cleared = self
            .guilds
            .get_mut(guild_id)
            .map(std::mem::take)
            .unwrap_or_default();

        ResetOutcome {
            total_removed: cleared.values().map(|t| u64::from(*t)).sum(),
            users_affected: cleared.len(),
        }
    }

    /// Drop a user who left the guild, returning what they held
    pub fn remove_member(&mut self, guild_id: &str, user_id: &str) -> Option<u32> {
        self.guilds.get_mut(guild_id)?.remove(user_id)
    }

    pub fn guild_stats(&self, guild_id: &str) -> Option<GuildStats> {
        let users = self.guilds.get(guild_id).filter(|users| !users.is_empty())?;
        let total_tokens: u64 = users.values().map(|t| u64::from(*t)).sum();
        let unique_users = users.len();
        Some(GuildStats {
            total_tokens,
            unique_users,
            max_tokens: users.values().copied().max().unwrap_or(0),
            average_tokens: total_tokens as f64 / unique_users as f64,
        })
    }
}

/// Platform mention markup for a user id
pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: &str = "guild-1";
    const USER: &str = "user-1";

    #[test]
    fn test_give_creates_entry() {
        let mut table = BalanceTable::new();
        assert_eq!(table.give(GUILD, USER, 2, 3).unwrap(), 2);
        assert_eq!(table.balance(GUILD, USER), 2);
    }

    #[test]
    fn test_give_rejects_over_limit() {
        let mut table = BalanceTable::new();
        table.give(GUILD, USER, 2, 3).unwrap();

        let result = table.give(GUILD, USER, 2, 3);
        assert!(matches!(
            result,
            Err(AppError::LimitExceeded {
                current: 2,
                amount: 2,
                max: 3
            })
        ));
        // Balance unchanged after rejection
        assert_eq!(table.balance(GUILD, USER), 2);
    }

    #[test]
    fn test_give_up_to_exact_limit() {
        let mut table = BalanceTable::new();
        table.give(GUILD, USER, 1, 3).unwrap();
        assert_eq!(table.give(GUILD, USER, 2, 3).unwrap(), 3);
    }

    #[test]
    fn test_remove_absent_user() {
        let mut table = BalanceTable::new();
        assert!(matches!(
            table.remove(GUILD, USER, 1),
            Err(AppError::NoBalance { .. })
        ));
    }

    #[test]
    fn test_remove_insufficient_leaves_balance() {
        let mut table = BalanceTable::new();
        table.give(GUILD, USER, 1, 3).unwrap();

        assert!(matches!(
            table.remove(GUILD, USER, 2),
            Err(AppError::InsufficientBalance {
                current: 1,
                requested: 2,
                ..
            })
        ));
        assert_eq!(table.balance(GUILD, USER), 1);
    }

    #[test]
    fn test_depletion_deletes_key() {
        let mut table = BalanceTable::new();
        table.give(GUILD, USER, 2, 3).unwrap();

        assert_eq!(table.deposit(GUILD, USER, 1).unwrap(), 1);
        assert_eq!(table.remove(GUILD, USER, 1).unwrap(), 0);

        assert!(table.holders(GUILD).is_empty());
        let json = serde_json::to_string(&table).unwrap();
        assert!(!json.contains(USER), "zero balance must not be stored: {}", json);
    }

    #[test]
    fn test_balance_never_stored_as_zero() {
        let mut table = BalanceTable::new();
        let ops: [(&str, u32); 8] = [
            ("give", 3),
            ("remove", 1),
            ("deposit", 2),
            ("give", 1),
            ("give", 3),
            ("remove", 1),
            ("deposit", 1),
            ("remove", 1),
        ];

        for (op, amount) in ops {
            let _ = match op {
                "give" => table.give(GUILD, USER, amount, 3),
                "remove" => table.remove(GUILD, USER, amount),
                _ => table.deposit(GUILD, USER, amount),
            };
            for (_, tokens) in table.holders(GUILD) {
                assert!(tokens >= 1);
            }
        }
    }

    #[test]
    fn test_reset_guild_only_touches_one_guild() {
        let mut table = BalanceTable::new();
        table.give(GUILD, "a", 3, 3).unwrap();
        table.give(GUILD, "b", 1, 3).unwrap();
        table.give("guild-2", "a", 2, 3).unwrap();

        let outcome = table.reset_guild(GUILD);
        assert_eq!(outcome.total_removed, 4);
        assert_eq!(outcome.users_affected, 2);
        assert!(table.holders(GUILD).is_empty());
        assert_eq!(table.balance("guild-2", "a"), 2);
    }

    #[test]
    fn test_remove_member() {
        let mut table = BalanceTable::new();
        table.give(GUILD, USER, 2, 3).unwrap();

        assert_eq!(table.remove_member(GUILD, USER), Some(2));
        assert_eq!(table.remove_member(GUILD, USER), None);
    }

    #[test]
    fn test_guild_stats() {
        let mut table = BalanceTable::new();
        assert!(table.guild_stats(GUILD).is_none());

        table.give(GUILD, "a", 3, 3).unwrap();
        table.give(GUILD, "b", 1, 3).unwrap();

        let stats = table.guild_stats(GUILD).unwrap();
        assert_eq!(stats.total_tokens, 4);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.max_tokens, 3);
        assert!((stats.average_tokens - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_shape() {
        let table: BalanceTable = serde_json::from_str(r#"{"1":{"10":2,"11":1},"2":{}}"#).unwrap();
        assert_eq!(table.balance("1", "10"), 2);
        assert_eq!(table.balance("2", "10"), 0);
    }
}
