pub mod balance;
pub mod interaction;
pub mod log_entry;
pub mod reply;

pub use balance::{BalanceTable, GuildStats, ResetOutcome};
pub use interaction::{Command, Guild, Interaction, Member, MemberRemoveEvent};
pub use log_entry::{ActionTag, LogEntry};
pub use reply::{Reply, ReplyField};
