mod api_error;
pub mod config;
mod crop_routes;
mod http_layers;
pub mod metrics;
pub mod server;
mod soil_routes;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
