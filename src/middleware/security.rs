//! Response-header hardening layer.
//!
//! [`configure`] registers a [`PolicySet`] against a router so that every
//! response, whichever handler produced it, passes through the policies before
//! leaving the process.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::HeaderName, uri::Scheme},
    middleware::{self, Next},
    response::Response,
    Extension, Router,
};

use crate::domain::models::PolicySet;

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Registers the policy layer on `router`.
///
/// Must be called after every route, nested router and fallback has been
/// added, since axum layers only wrap what the router already holds.
pub fn configure(router: Router, policies: Arc<PolicySet>) -> Router {
    for (position, name) in policies.names().into_iter().enumerate() {
        tracing::debug!(position, policy = name, "Registered header policy");
    }
    tracing::info!(count = policies.len(), "Response header policies registered");

    router
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(Extension(policies))
}

/// Applies the shared [`PolicySet`] to the response produced by the inner
/// service.
pub async fn security_headers_middleware(
    Extension(policies): Extension<Arc<PolicySet>>,
    request: Request,
    next: Next,
) -> Response {
    let secure = is_secure_request(&request);
    let mut response = next.run(request).await;
    policies.apply(secure, response.headers_mut());
    response
}

/// A request counts as secure when it arrived over TLS, either directly or as
/// reported by a terminating proxy.
pub fn is_secure_request(request: &Request) -> bool {
    if request.uri().scheme() == Some(&Scheme::HTTPS) {
        return true;
    }

    request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
