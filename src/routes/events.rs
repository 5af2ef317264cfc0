use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;

use super::validation::decode_signed;
use crate::commands::tokens::member_left;
use crate::error::Result;
use crate::models::MemberRemoveEvent;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MemberRemoveResponse {
    /// Tokens the member held when they left
    pub removed: u32,
}

/// A member left a guild; drop whatever they held
pub async fn member_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MemberRemoveResponse>> {
    let event: MemberRemoveEvent = decode_signed(&headers, &body, &state.config.app_secret_key)?;
    let removed = member_left(&state, &event).await?;
    Ok(Json(MemberRemoveResponse { removed }))
}
