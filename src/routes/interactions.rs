use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use super::validation::decode_signed;
use crate::commands;
use crate::error::Result;
use crate::models::{Interaction, Reply};
use crate::AppState;

/// Run one slash command forwarded by the gateway
///
/// The body is verified against the signature headers before it is parsed.
pub async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Reply>> {
    let interaction: Interaction = decode_signed(&headers, &body, &state.config.app_secret_key)?;
    let reply = commands::execute(&state, &interaction).await?;
    Ok(Json(reply))
}
