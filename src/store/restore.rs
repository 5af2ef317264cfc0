use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::{AppError, Result};

/// A restore an admin asked for and has not confirmed yet
#[derive(Debug, Clone)]
struct PendingRestore {
    index: i64,
    file_name: String,
    requested_at: Instant,
}

/// Restore requests awaiting confirmation, keyed by guild and admin
///
/// Held in memory only: a restart drops every pending request.
#[derive(Clone)]
pub struct PendingRestores {
    pending: Arc<Mutex<HashMap<(String, String), PendingRestore>>>,
    ttl: Duration,
}

impl PendingRestores {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Remember that `admin_id` wants to restore `file_name` (listed at `index`).
    /// Replaces any earlier request by the same admin in the same guild.
    pub async fn request(&self, guild_id: &str, admin_id: &str, index: i64, file_name: &str) {
        self.request_at(guild_id, admin_id, index, file_name, Instant::now())
            .await;
    }

    /// Same as [`PendingRestores::request`] at an explicit time.
    /// Requests that expired without being confirmed are dropped here.
    pub async fn request_at(
        &self,
        guild_id: &str,
        admin_id: &str,
        index: i64,
        file_name: &str,
        now: Instant,
    ) {
        let ttl = self.ttl;
        let mut pending = self.pending.lock().await;
        pending.retain(|_, request| now.saturating_duration_since(request.requested_at) <= ttl);
        pending.insert(
            (guild_id.to_string(), admin_id.to_string()),
            PendingRestore {
                index,
                file_name: file_name.to_string(),
                requested_at: now,
            },
        );
    }

    /// Number of requests awaiting confirmation
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Consume the pending request matching `index`, returning the file it
    /// was bound to
    pub async fn confirm(&self, guild_id: &str, admin_id: &str, index: i64) -> Result<String> {
        self.confirm_at(guild_id, admin_id, index, Instant::now()).await
    }

    pub async fn confirm_at(
        &self,
        guild_id: &str,
        admin_id: &str,
        index: i64,
        now: Instant,
    ) -> Result<String> {
        let key = (guild_id.to_string(), admin_id.to_string());
        let mut pending = self.pending.lock().await;

        let Some(request) = pending.get(&key) else {
            return Err(AppError::NoPendingRestore { index });
        };

        if now.saturating_duration_since(request.requested_at) > self.ttl {
            tracing::info!("Pending restore of {} expired", request.file_name);
            pending.remove(&key);
            return Err(AppError::NoPendingRestore { index });
        }

        if request.index != index {
            return Err(AppError::NoPendingRestore { index });
        }

        let request = pending.remove(&key).ok_or(AppError::NoPendingRestore { index })?;
        Ok(request.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "token_data_backup_20240501_120000.json";

    #[tokio::test]
    async fn test_confirm_matching_request() {
        let restores = PendingRestores::new(Duration::from_secs(300));
        restores.request("g", "admin", 2, FILE).await;

        assert_eq!(restores.confirm("g", "admin", 2).await.unwrap(), FILE);
        // Consumed
        assert!(matches!(
            restores.confirm("g", "admin", 2).await,
            Err(AppError::NoPendingRestore { index: 2 })
        ));
    }

    #[tokio::test]
    async fn test_confirm_requires_same_admin_and_guild() {
        let restores = PendingRestores::new(Duration::from_secs(300));
        restores.request("g", "admin", 1, FILE).await;

        assert!(restores.confirm("g", "other-admin", 1).await.is_err());
        assert!(restores.confirm("other-guild", "admin", 1).await.is_err());
        assert!(restores.confirm("g", "admin", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_index_keeps_request() {
        let restores = PendingRestores::new(Duration::from_secs(300));
        restores.request("g", "admin", 1, FILE).await;

        assert!(restores.confirm("g", "admin", 3).await.is_err());
        assert!(restores.confirm("g", "admin", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_new_request_drops_expired_ones() {
        let restores = PendingRestores::new(Duration::from_secs(60));
        let start = Instant::now();
        restores.request_at("g", "admin-1", 1, FILE, start).await;
        restores.request_at("g", "admin-2", 1, FILE, start).await;
        assert_eq!(restores.len().await, 2);

        let later = start + Duration::from_secs(61);
        restores.request_at("other", "admin-3", 2, FILE, later).await;
        assert_eq!(restores.len().await, 1);
        assert!(restores.confirm_at("other", "admin-3", 2, later).await.is_ok());
        assert!(restores.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_request() {
        let restores = PendingRestores::new(Duration::from_secs(60));
        restores.request("g", "admin", 1, FILE).await;

        let later = Instant::now() + Duration::from_secs(61);
        assert!(restores.confirm_at("g", "admin", 1, later).await.is_err());
        assert!(restores.confirm("g", "admin", 1).await.is_err());
    }
}
