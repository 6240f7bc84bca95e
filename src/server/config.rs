use super::RequestsLoggingLevel;
use crate::soil::DEFAULT_TOP_N;

/// Largest page a history request may ask for.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub frontend_dir_path: Option<String>,
    /// How many crop matches an analysis keeps when the request does not say.
    pub default_crop_matches: usize,
    /// Page size of history listings when `limit` is omitted.
    pub history_page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 5000,
            metrics_port: 9091,
            frontend_dir_path: None,
            default_crop_matches: DEFAULT_TOP_N,
            history_page_size: 20,
        }
    }
}
