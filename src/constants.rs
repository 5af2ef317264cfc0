/// Most tokens a single `give` command may hand out
pub const MAX_GIVE_PER_COMMAND: i64 = 3;

/// File name prefix of rotated ledger snapshots
pub const BACKUP_PREFIX: &str = "token_data_backup_";

/// File name prefix of the safety copy taken before a restore.
/// These files are never listed or rotated.
pub const PRE_RESTORE_PREFIX: &str = "pre_restore_backup_";

/// Timestamp format used in backup file names (second granularity)
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format at the start of every transaction log line
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Guild name used for audit entries not tied to a server
pub const SYSTEM_GUILD: &str = "SYSTEM";

/// Maximum age of a gateway request signature in seconds (5 minutes)
/// Prevents replay attacks
pub const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Header carrying the hex HMAC of `timestamp + body`
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the unix timestamp the gateway signed
pub const SIGNATURE_TIMESTAMP_HEADER: &str = "x-signature-timestamp";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for give amounts outside 1..=MAX_GIVE_PER_COMMAND
pub const ERR_GIVE_RANGE: &str = "You can only give 1-3 tokens at a time.";

/// Error message for non-positive remove amounts
pub const ERR_AMOUNT_POSITIVE: &str = "Amount must be a positive number.";

/// Error message for non-positive deposit amounts
pub const ERR_DEPOSIT_POSITIVE: &str = "You must deposit at least 1 token.";

/// Error message for timestamp validation failure
pub const ERR_INVALID_TIMESTAMP: &str = "Timestamp too old or in the future";
