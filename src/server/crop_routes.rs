//! Crop ranking and recommendation HTTP routes.

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
use serde_json::Value;
use tracing::info;

use super::api_error::{ApiError, ApiResult};
use super::metrics::record_crop_recommendations;
use super::soil_routes::{DataResponse, PaginationQuery};
use super::state::ServerState;
use crate::soil::{
    advise, check_range, coerce_integer, rank, CropMatch, RawSoilProfile, ValidationError,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RankQuery {
    top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    suitable_crops: Vec<CropMatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecommendCropsBody {
    user_id: Option<Value>,
    soil_analysis_id: Option<Value>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /rank - Suitable crops for a profile, best first
async fn rank_crops(
    State(state): State<ServerState>,
    query: Result<Query<RankQuery>, QueryRejection>,
    body: Result<Json<RawSoilProfile>, JsonRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let Json(raw) = body?;

    let catalog = state.analyzer.catalog();
    // Asking for more crops than the catalog holds yields all that qualify
    let top_n = query
        .top_n
        .unwrap_or(state.analyzer.top_n())
        .min(catalog.len());
    let top_n = check_range("top_n", top_n, 1, catalog.len())?;
    let profile = raw.validate()?;
    let suitable_crops = rank(&profile, catalog, top_n);
    Ok(Json(RankResponse { suitable_crops }).into_response())
}

/// POST /recommend - Detailed crop recommendations for an owner, stored
///
/// Uses the referenced analysis, or the owner's latest one when none is given.
async fn recommend_crops(
    State(state): State<ServerState>,
    body: Result<Json<RecommendCropsBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let owner_id = coerce_integer("user_id", body.user_id.as_ref())?
        .ok_or(ValidationError::MissingField("user_id"))?;
    let analysis_id = coerce_integer("soil_analysis_id", body.soil_analysis_id.as_ref())?;

    let analysis = match analysis_id {
        Some(id) => Some(
            state
                .soil_store
                .get_analysis(id)?
                .ok_or_else(|| ApiError::not_found(format!("Soil analysis {} not found", id)))?,
        ),
        None => state.soil_store.get_latest_analysis(owner_id)?,
    };

    let recommendations = advise(analysis.as_ref());
    let stored = state.soil_store.add_crop_recommendations(
        owner_id,
        analysis.as_ref().map(|a| a.id),
        &recommendations,
    )?;

    let source = if analysis.is_some() { "analysis" } else { "reference" };
    record_crop_recommendations(source, stored.len());
    info!(
        "Stored {} crop recommendations for owner {} from {}",
        stored.len(),
        owner_id,
        source
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })).into_response())
}

/// GET /recommendations/{user_id} - Owner's stored crop recommendations, newest first
async fn get_recommendations(
    State(state): State<ServerState>,
    user_id: Result<Path<i64>, PathRejection>,
    pagination: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Path(user_id) = user_id?;
    let Query(pagination) = pagination?;
    let limit = pagination.limit(&state.config)?;

    let recommendations =
        state
            .soil_store
            .list_crop_recommendations(user_id, limit, pagination.offset)?;
    Ok(Json(DataResponse {
        data: recommendations,
    })
    .into_response())
}

pub fn make_crop_routes(state: ServerState) -> Router {
    Router::new()
        .route("/rank", post(rank_crops))
        .route("/recommend", post(recommend_crops))
        .route("/recommendations/{user_id}", get(get_recommendations))
        .with_state(state)
}
