pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

pub use handlers::AppState;

/// All HTTP entry points; each is a thin adapter over one engine
/// operation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/ingestions/list", get(handlers::list_ingestions))
        .route("/api/ingestions/metrics", get(handlers::metrics))
        .route("/api/ingestions/:id", get(handlers::ingestion_detail))
        .route("/api/ingestions/:id/items", get(handlers::search_items))
        .route("/api/ingestions/:id/ready", post(handlers::request_ready))
        .route("/api/ingestions/:id/start", post(handlers::start_ingestion))
        .route(
            "/api/ingestions/:id/lines/:line_id/assign",
            post(handlers::assign_item),
        )
        .route(
            "/api/ingestions/:id/lines/:line_id/needs-create",
            post(handlers::mark_needs_create),
        )
        .route("/api/lines/:line_id/candidates", get(handlers::line_candidates))
        .with_state(state)
}
