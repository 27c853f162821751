use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost, so the trace span sees the request id
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Choice log
        .route("/choice", post(handlers::record_choice))
        .route("/choices", get(handlers::list_choices))
        .route("/summary", get(handlers::summary))
        // Session
        .route("/session", get(handlers::get_session))
        .route("/session/swipe", post(handlers::swipe))
        .route("/session/skip", post(handlers::skip))
        .route("/session/reset", post(handlers::reset))
        // Catalog
        .route("/catalog/search", post(handlers::search_catalog))
}
