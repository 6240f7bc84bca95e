//! Krishi Server Library
//!
//! Soil analysis engines, their SQLite persistence and the HTTP server on top.

pub mod config;
pub mod server;
pub mod soil;
pub mod soil_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use soil::{analyze_soil, rank_crops, recommend_only, score_only, SoilAnalyzer};
pub use soil_store::{SoilStore, SqliteSoilStore};
