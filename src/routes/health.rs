use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Liveness text for uptime pingers
pub async fn home() -> &'static str {
    "Token Bank Bot is alive!"
}

/// Health check endpoint
///
/// Reports whether the ledger file is present and readable. A missing
/// ledger is normal before the first token is given.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let ledger_status = match tokio::fs::metadata(state.ledger.path()).await {
        Ok(meta) if meta.is_file() => "present",
        Ok(_) => "invalid",
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "empty",
        Err(e) => {
            tracing::error!("Ledger health check failed: {:?}", e);
            "unreadable"
        }
    };

    Json(json!({
        "status": if matches!(ledger_status, "present" | "empty") { "healthy" } else { "unhealthy" },
        "ledger": ledger_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
