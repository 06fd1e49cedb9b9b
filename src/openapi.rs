use std::fs;
use std::path::Path;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hardhat API",
        version = "0.1.0",
        description = "Introspection endpoints mounted under /_api",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server"),
        (url = "/", description = "Current server")
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::app_info,
    ),
    components(schemas(
        crate::api::handlers::HealthResponse,
        crate::api::handlers::AppInfoResponse,
        crate::domain::models::AppFeatures,
        crate::error::ErrorResponse,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "App", description = "Response header policy introspection")
    )
)]
pub struct ApiDoc;

pub fn generate_openapi_json(
    output_path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let openapi_json = ApiDoc::openapi().to_pretty_json()?;

    if let Some(parent) = output_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(output_path.as_ref(), openapi_json)?;

    tracing::info!(
        "OpenAPI specification written to {}",
        output_path.as_ref().display()
    );

    Ok(())
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
