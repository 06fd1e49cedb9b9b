//! End-to-end tests against the router built by `create_router`, with the
//! static directory and index document provided by a temporary fixture.

use std::fs;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{
            CONTENT_SECURITY_POLICY, CONTENT_TYPE, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use hardhat::config::Settings;
use hardhat::domain::models::{X_DOWNLOAD_OPTIONS, X_POWERED_BY};
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX_HTML: &str = "<!DOCTYPE html><html><body><h1>index</h1></body></html>";

struct Fixture {
    _dir: TempDir,
    app: Router,
}

fn fixture_with(configure: impl FnOnce(&mut Settings)) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let public = dir.path().join("public");
    let views = dir.path().join("views");
    fs::create_dir_all(&public).expect("public dir");
    fs::create_dir_all(&views).expect("views dir");
    fs::write(public.join("style.css"), "body { margin: 0; }").expect("style.css");
    fs::write(views.join("index.html"), INDEX_HTML).expect("index.html");

    let mut settings = Settings::default();
    settings.assets.static_dir = public;
    settings.assets.index_file = views.join("index.html");
    configure(&mut settings);

    let app = hardhat::create_router(&settings).expect("router");
    Fixture { _dir: dir, app }
}

fn fixture() -> Fixture {
    fixture_with(|_| {})
}

async fn send(app: Router, method: Method, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
    .expect("response")
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn assert_hardened(response: &Response) {
    let headers = response.headers();
    assert!(!headers.contains_key(X_POWERED_BY));
    assert_eq!(headers.get(X_FRAME_OPTIONS).expect("frame"), "DENY");
    assert_eq!(
        headers.get(X_CONTENT_TYPE_OPTIONS).expect("nosniff"),
        "nosniff"
    );
    assert_eq!(headers.get(X_DOWNLOAD_OPTIONS).expect("noopen"), "noopen");
    assert_eq!(
        headers.get(STRICT_TRANSPORT_SECURITY).expect("hsts"),
        "max-age=7776000; includeSubDomains"
    );
    assert_eq!(
        headers.get(CONTENT_SECURITY_POLICY).expect("csp"),
        "default-src 'self'; script-src 'self' trusted-cdn.com"
    );
}

#[tokio::test]
async fn test_index_document_served_at_root() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_hardened(&response);
    assert!(response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html")));
    assert_eq!(body_string(response).await, INDEX_HTML);
}

#[tokio::test]
async fn test_static_asset_served_with_policies() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/style.css").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_hardened(&response);
    assert_eq!(body_string(response).await, "body { margin: 0; }");
}

#[tokio::test]
async fn test_missing_asset_still_hardened() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/missing.js").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_hardened(&response);
}

#[tokio::test]
async fn test_api_requests_reach_sub_router() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/_api/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_hardened(&response);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_method_is_preserved() {
    let Fixture { _dir, app } = fixture();

    // The sub-router only answers GET on /health; it decides the outcome.
    let response = send(app, Method::DELETE, "/_api/health").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_hardened(&response);
}

#[tokio::test]
async fn test_unknown_api_path_uses_sub_router_fallback() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/_api/nothing/here").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_hardened(&response);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(
        body["error"]["message"],
        "Resource not found: /_api/nothing/here"
    );
}

#[tokio::test]
async fn test_app_info_reports_disabled_strict_transport_feature() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/_api/app-info").await;

    assert_eq!(response.status(), StatusCode::OK);
    // The feature switch is off, yet the forced hsts policy still writes its header.
    assert!(response.headers().contains_key(STRICT_TRANSPORT_SECURITY));
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(body["features"]["strict_transport_security"], false);
    assert_eq!(body["headers"]["x-download-options"], "noopen");
}

#[tokio::test]
async fn test_openapi_document_served_under_api() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::GET, "/_api/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_hardened(&response);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json");
    assert!(body["paths"]["/_api/app-info"].is_object());
    assert!(body["paths"]["/_api/health"]["get"].is_object());
}

#[tokio::test]
async fn test_root_only_answers_get() {
    let Fixture { _dir, app } = fixture();

    let response = send(app, Method::POST, "/").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_hardened(&response);
}

#[tokio::test]
async fn test_sameorigin_frame_action() {
    let Fixture { _dir, app } = fixture_with(|settings| {
        settings.security.frame_action = "sameorigin".parse().expect("frame action");
    });

    let response = send(app, Method::GET, "/").await;

    assert_eq!(
        response.headers().get(X_FRAME_OPTIONS).expect("frame"),
        "SAMEORIGIN"
    );
}
