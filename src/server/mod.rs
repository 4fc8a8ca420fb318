pub mod routes;
pub mod ws;

use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;

pub fn router(state: Arc<AppState>, dashboard_dir: &Path) -> Router {
    Router::new()
        .route("/api/records", get(routes::get_records))
        .route("/api/records/binomial", post(routes::post_binomial))
        .route("/api/records/ho-lee", post(routes::post_ho_lee))
        .route("/api/records/{id}", delete(routes::delete_record))
        .route("/api/view", get(routes::get_view))
        .route("/api/undo", post(routes::post_undo))
        .route("/api/counters", get(routes::get_counters))
        .route("/ws", get(ws::ws_handler))
        .fallback_service(
            tower_http::services::ServeDir::new(dashboard_dir)
                .fallback(tower_http::services::ServeFile::new(dashboard_dir.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
