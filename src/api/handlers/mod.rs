mod app_info;
mod health;

pub use app_info::*;
pub use health::*;
