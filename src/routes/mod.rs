use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        escalator::EscalationPolicy,
        providers::{gemini::GeminiProvider, ModelGateway},
    },
};

pub mod recommendations;

/// Shared, read-only application state
pub struct AppState {
    /// `None` when no credential was configured; every request is then refused
    pub gateway: Option<Arc<dyn ModelGateway>>,
    pub policy: EscalationPolicy,
}

impl AppState {
    pub fn new(gateway: Option<Arc<dyn ModelGateway>>, policy: EscalationPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Builds the Gemini-backed state from configuration
    pub fn from_config(config: &Config) -> Self {
        let gateway = config.api_key().map(|key| {
            Arc::new(GeminiProvider::new(
                key.to_string(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            )) as Arc<dyn ModelGateway>
        });

        if gateway.is_none() {
            tracing::error!("GEMINI_API_KEY is not set; recommendation requests will fail");
        }

        Self::new(gateway, config.escalation_policy())
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommendations::recommend))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/recommend", post(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
