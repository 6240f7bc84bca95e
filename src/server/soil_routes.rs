//! Soil analysis HTTP routes.
//!
//! Provides endpoints for:
//! - Running and storing a full analysis of a sample
//! - Browsing an owner's analysis history
//! - Scoring and recommending over a bare soil profile, nothing stored

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::api_error::{ApiError, ApiResult};
use super::config::MAX_PAGE_SIZE;
use super::metrics::record_soil_analysis;
use super::state::{GuardedSoilStore, ServerState};
use super::ServerConfig;
use crate::soil::{
    check_range, recommend_only, score_only, AnalyzeSoilInput, CropMatch, HealthScore,
    RawSoilProfile, Recommendation, SoilAnalysis, ValidationResult,
};
use crate::soil_store::DuplicateSampleId;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl PaginationQuery {
    /// Resolves the page size against the configured default and bounds.
    pub fn limit(&self, config: &ServerConfig) -> ValidationResult<usize> {
        check_range(
            "limit",
            self.limit.unwrap_or(config.history_page_size),
            1,
            MAX_PAGE_SIZE,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Response for POST /analyze
#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    data: SoilAnalysis,
    recommendations: Vec<Recommendation>,
    suitable_crops: Vec<CropMatch>,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    health_score: HealthScore,
}

#[derive(Debug, Serialize)]
struct RecommendationsResponse {
    recommendations: Vec<Recommendation>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /analyze - Analyze a sample, filling missing measurements, and store it
async fn analyze_soil(
    State(state): State<ServerState>,
    body: Result<Json<AnalyzeSoilInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = body?;

    let mut result = {
        let mut rng = state.rng.lock().unwrap();
        state
            .analyzer
            .analyze(&input, &mut *rng, state.sample_ids.as_ref())?
    };
    let analysis = match state.soil_store.create_analysis(&result) {
        Err(err) if err.is::<DuplicateSampleId>() => {
            let retry_id = {
                let mut rng = state.rng.lock().unwrap();
                state.sample_ids.next_sample_id(&mut *rng)
            };
            let taken = std::mem::replace(&mut result.sample_id, retry_id);
            warn!("Sample id {} already taken, retrying as {}", taken, result.sample_id);
            state.soil_store.create_analysis(&result)?
        }
        stored => stored?,
    };

    record_soil_analysis(analysis.health_score.value(), analysis.crop_matches.len());
    info!(
        "Stored analysis {} ({}) for owner {}: score {}, {} suitable crops",
        analysis.id,
        analysis.sample_id,
        analysis.owner_id,
        analysis.health_score,
        analysis.crop_matches.len()
    );

    let response = AnalyzeResponse {
        recommendations: analysis.recommendations.clone(),
        suitable_crops: analysis.crop_matches.clone(),
        data: analysis,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /history/{user_id} - Owner's analyses, newest first
async fn get_history(
    State(state): State<ServerState>,
    user_id: Result<Path<i64>, PathRejection>,
    pagination: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Path(user_id) = user_id?;
    let Query(pagination) = pagination?;
    let limit = pagination.limit(&state.config)?;

    let analyses = state
        .soil_store
        .list_analyses_by_owner(user_id, limit, pagination.offset)?;
    debug!(
        "Returning {} analyses for owner {} (limit {}, offset {})",
        analyses.len(),
        user_id,
        limit,
        pagination.offset
    );
    Ok(Json(DataResponse { data: analyses }).into_response())
}

/// GET /{analysis_id} - A single stored analysis
async fn get_analysis(
    State(soil_store): State<GuardedSoilStore>,
    analysis_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Response> {
    let Path(analysis_id) = analysis_id?;
    match soil_store.get_analysis(analysis_id)? {
        Some(analysis) => Ok(Json(DataResponse { data: analysis }).into_response()),
        None => Err(ApiError::not_found(format!(
            "Soil analysis {} not found",
            analysis_id
        ))),
    }
}

/// POST /score - Health score of a profile, absent fields are skipped
async fn score_profile(body: Result<Json<RawSoilProfile>, JsonRejection>) -> ApiResult<Response> {
    let Json(raw) = body?;
    let health_score = score_only(&raw)?;
    Ok(Json(ScoreResponse { health_score }).into_response())
}

/// POST /recommendations - Improvement actions for a profile
async fn recommend_profile(
    body: Result<Json<RawSoilProfile>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(raw) = body?;
    let recommendations = recommend_only(&raw)?;
    Ok(Json(RecommendationsResponse { recommendations }).into_response())
}

pub fn make_soil_routes(state: ServerState) -> Router {
    Router::new()
        .route("/analyze", post(analyze_soil))
        .route("/history/{user_id}", get(get_history))
        .route("/score", post(score_profile))
        .route("/recommendations", post(recommend_profile))
        .route("/{analysis_id}", get(get_analysis))
        .with_state(state)
}
