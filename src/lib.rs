pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod openapi;

pub use api::create_router;
pub use config::Settings;
pub use domain::models::{AppFeatures, Policy, PolicyKind, PolicySet};
pub use error::{AppError, AppResult};
pub use middleware::configure;
pub use openapi::{generate_openapi_json, get_openapi_spec};
