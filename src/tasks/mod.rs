//! Background loops started alongside the HTTP server

pub mod backup;
pub mod keepalive;

pub use backup::{run_scheduled_backup, spawn_backup_loop};
pub use keepalive::spawn_keepalive_loop;
