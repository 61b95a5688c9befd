pub mod capsules;
pub mod health;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use capsule_core::app::CapsuleService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CapsuleService>,
}

impl AppState {
    pub fn new(service: CapsuleService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/capsules",
            get(capsules::list_capsules).post(capsules::create_capsule),
        )
        .route("/api/capsules/unlocked", get(capsules::unlocked_capsules))
        .route("/api/capsules/locked", get(capsules::locked_capsules))
        .route(
            "/api/capsules/{id}",
            get(capsules::get_capsule).delete(capsules::delete_capsule),
        )
        .route(
            "/api/capsules/{id}/position",
            patch(capsules::update_position),
        )
        .route("/api/tags", get(capsules::list_tags))
        .route("/api/stats", get(capsules::stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve a frontend directory for every path the API does not claim.
///
/// Missing files fall back to `index.html` so client-side routes resolve.
pub fn with_frontend(router: Router, dir: impl AsRef<Path>) -> Router {
    let dir = dir.as_ref();
    let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
    router.fallback_service(spa)
}
