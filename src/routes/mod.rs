pub mod events;
pub mod health;
pub mod interactions;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use events::member_remove;
pub use health::{health_check, home};
pub use interactions::handle_interaction;
pub use validation::{decode_signed, validate_signed_request};

use crate::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/api/interactions", post(handle_interaction))
        .route("/api/events/member-remove", post(member_remove))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
