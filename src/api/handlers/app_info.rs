use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::models::{AppFeatures, PolicySet};
use crate::middleware::is_secure_request;

#[derive(Clone)]
pub struct ApiState {
    pub policies: Arc<PolicySet>,
    pub features: AppFeatures,
}

/// Describes the hardening applied to the exchange that requested it.
#[derive(Debug, Serialize, ToSchema)]
pub struct AppInfoResponse {
    /// Registered policy names, in application order.
    pub policies: Vec<String>,
    pub headers: BTreeMap<String, String>,
    pub removed: Vec<String>,
    pub secure: bool,
    pub features: AppFeatures,
}

#[utoipa::path(
    get,
    path = "/_api/app-info",
    responses(
        (status = 200, description = "Header policies applied to this exchange", body = AppInfoResponse)
    ),
    tag = "App"
)]
pub async fn app_info(State(state): State<ApiState>, request: Request) -> Json<AppInfoResponse> {
    let secure = is_secure_request(&request);

    let mut written = HeaderMap::new();
    state.policies.apply(secure, &mut written);

    let headers = written
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let removed = state
        .policies
        .removed_headers(secure)
        .into_iter()
        .map(|name| name.as_str().to_string())
        .collect();

    Json(AppInfoResponse {
        policies: state
            .policies
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
        headers,
        removed,
        secure,
        features: state.features,
    })
}
