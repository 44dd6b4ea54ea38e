pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod http;
pub mod utils;

pub use app::Services;
pub use config::{AppConfig, ServeArgs};
pub use http::{build_router, serve};
pub use utils::error::{LensError, Result};
