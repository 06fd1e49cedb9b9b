pub mod handlers;
pub mod routes;

pub use routes::{api_router, create_router};
