use std::sync::Arc;

use axum::{ Router, routing::{ get, post } };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };

pub mod badge;

use crate::services::BadgeService;

#[derive(Clone)]
pub struct AppState {
    pub badge_service: Arc<BadgeService>,
}

impl AppState {
    pub fn new(badge_service: Arc<BadgeService>) -> Self {
        Self { badge_service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/badges/render", post(badge::render_badge))
        .route("/api/badges/issue", post(badge::issue_badge))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
