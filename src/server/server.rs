use anyhow::{Context, Result};
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rand::rngs::StdRng;
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::{error, info};

use super::crop_routes::make_crop_routes;
use super::metrics::metrics_handler;
use super::soil_routes::make_soil_routes;
use super::{log_requests, state::ServerState, ServerConfig};
use crate::soil::{CropCatalog, SampleIdGenerator, SoilAnalyzer};
use crate::soil_store::SoilStore;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

impl ServerState {
    fn new(
        config: ServerConfig,
        soil_store: Arc<dyn SoilStore>,
        rng: StdRng,
        sample_ids: Arc<dyn SampleIdGenerator>,
    ) -> ServerState {
        let analyzer = SoilAnalyzer::new(CropCatalog::builtin(), config.default_crop_matches);
        ServerState {
            config,
            start_time: Instant::now(),
            soil_store,
            analyzer,
            rng: Arc::new(Mutex::new(rng)),
            sample_ids,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

/// Builds the public API router.
///
/// The random generator drives gap filling and sample id suffixes, seed it for
/// reproducible analyses.
pub fn make_app(
    config: ServerConfig,
    soil_store: Arc<dyn SoilStore>,
    rng: StdRng,
    sample_ids: Arc<dyn SampleIdGenerator>,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), soil_store, rng, sample_ids);

    let soil_routes = make_soil_routes(state.clone());
    let crop_routes = make_crop_routes(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1/soil", soil_routes)
        .nest("/v1/crops", crop_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    soil_store: Arc<dyn SoilStore>,
    rng: StdRng,
    sample_ids: Arc<dyn SampleIdGenerator>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, soil_store, rng, sample_ids)?;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    info!("Serving metrics on port {}", metrics_port);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
