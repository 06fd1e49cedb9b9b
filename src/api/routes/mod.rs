use std::sync::Arc;

use axum::{
    routing::{get, get_service},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{self, ApiState};
use crate::config::Settings;
use crate::domain::models::{AppFeatures, PolicySet};
use crate::error::AppResult;
use crate::middleware::configure;

pub const API_PREFIX: &str = "/_api";

/// The sub-router mounted under [`API_PREFIX`]. Requests reach it with the
/// prefix stripped and their method untouched.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/app-info", get(handlers::app_info))
        .route("/openapi.json", get(handlers::openapi_json))
        .fallback(handlers::api_not_found)
        .with_state(state)
}

pub fn create_router(settings: &Settings) -> AppResult<Router> {
    let policies = Arc::new(PolicySet::from_settings(&settings.security)?);

    let features = AppFeatures::default().disable_strict_transport_security();
    if policies.enforces_strict_transport() && !features.strict_transport_security {
        // Kept as observed: the feature switch never reaches the hsts policy.
        tracing::warn!(
            max_age = settings.security.hsts_max_age,
            force = settings.security.hsts_force,
            "strict-transport-security feature is disabled but the hsts policy is registered; \
             Strict-Transport-Security will still be sent"
        );
    }

    let static_dir = &settings.assets.static_dir;
    if static_dir.is_dir() {
        tracing::info!("Serving static assets from {}", static_dir.display());
    } else {
        tracing::warn!(
            "Static directory {} not found, asset requests will return 404",
            static_dir.display()
        );
    }

    let index_file = &settings.assets.index_file;
    if !index_file.is_file() {
        tracing::warn!("Index document {} not found", index_file.display());
    }

    let api_state = ApiState {
        policies: policies.clone(),
        features,
    };

    let app = Router::new()
        .route("/", get_service(ServeFile::new(index_file)))
        .nest(API_PREFIX, api_router(api_state))
        .fallback_service(ServeDir::new(static_dir));

    Ok(configure(app, policies).layer(TraceLayer::new_for_http()))
}
