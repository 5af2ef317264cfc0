use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Ledger file holding every guild's balances
    pub token_file: PathBuf,
    /// Append-only transaction log
    pub log_file: PathBuf,
    pub backup_dir: PathBuf,
    pub max_tokens_per_user: u32,
    pub max_backups: usize,
    pub backup_interval_secs: u64,
    pub default_log_entries: usize,
    pub admin_role_name: String,
    pub restore_confirm_ttl_secs: u64,
    /// Public URL pinged by the keep-alive task, disabled when unset
    pub keepalive_url: Option<String>,
    pub keepalive_interval_secs: u64,
    pub environment: String,
    pub app_secret_key: String,
}

/// Read `key` from the environment, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &str, default: &str) -> Result<T, String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {}", key))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env_or("SERVER_PORT", "10000")?;

        let token_file = env_or("TOKEN_FILE", "token_data.json")?;
        let log_file = env_or("LOG_FILE", "token_transactions.log")?;
        let backup_dir = env_or("BACKUP_DIR", "backups")?;

        let max_tokens_per_user = env_or("MAX_TOKENS_PER_USER", "3")?;
        let max_backups = env_or("MAX_BACKUPS", "5")?;
        let backup_interval_secs = env_or("BACKUP_INTERVAL_SECS", "86400")?;
        let default_log_entries = env_or("DEFAULT_LOG_ENTRIES", "10")?;
        let restore_confirm_ttl_secs = env_or("RESTORE_CONFIRM_TTL_SECS", "300")?;

        let admin_role_name = env::var("ADMIN_ROLE_NAME").unwrap_or_else(|_| "Admin".to_string());

        let keepalive_url = env::var("APP_URL").ok().filter(|url| !url.trim().is_empty());
        let keepalive_interval_secs = env_or("KEEPALIVE_INTERVAL_SECS", "120")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let app_secret_key = env::var("APP_SECRET_KEY")
            .map_err(|_| "APP_SECRET_KEY must be set for gateway signature verification")?;

        if backup_interval_secs == 0 {
            return Err("BACKUP_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Config {
            server_host,
            server_port,
            token_file,
            log_file,
            backup_dir,
            max_tokens_per_user,
            max_backups,
            backup_interval_secs,
            default_log_entries,
            admin_role_name,
            restore_confirm_ttl_secs,
            keepalive_url,
            keepalive_interval_secs,
            environment,
            app_secret_key,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs.max(1))
    }

    pub fn restore_confirm_ttl(&self) -> Duration {
        Duration::from_secs(self.restore_confirm_ttl_secs)
    }
}
