use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Folio endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/branches/:branch_id/commits",
            get(handler::list_commits_handler),
        )
        .route("/v1/branches/:branch_id/diff", get(handler::diff_handler))
        .route(
            "/v1/branches/:branch_id/rollback",
            post(handler::rollback_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
