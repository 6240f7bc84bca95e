mod schema;
mod sqlite_soil_store;

pub use schema::SOIL_VERSIONED_SCHEMAS;
pub use sqlite_soil_store::SqliteSoilStore;

use crate::soil::{AnalysisResult, CropRecommendation, NewCropRecommendation, SoilAnalysis};
use anyhow::Result;
use thiserror::Error;

/// Returned by [`SoilStore::create_analysis`] when the sample id is taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Sample id {0} is already stored")]
pub struct DuplicateSampleId(pub String);

/// Persistence for analysis snapshots and crop recommendations.
///
/// Lists are ordered newest first.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait SoilStore: Send + Sync {
    /// Stores an analysis and returns it with its id and creation time.
    ///
    /// Fails with [`DuplicateSampleId`] when the sample id already exists.
    fn create_analysis(&self, analysis: &AnalysisResult) -> Result<SoilAnalysis>;
    fn get_analysis(&self, id: i64) -> Result<Option<SoilAnalysis>>;
    fn get_latest_analysis(&self, owner_id: i64) -> Result<Option<SoilAnalysis>>;
    fn list_analyses_by_owner(
        &self,
        owner_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SoilAnalysis>>;

    /// Stores all recommendations or none of them.
    fn add_crop_recommendations(
        &self,
        owner_id: i64,
        soil_analysis_id: Option<i64>,
        recommendations: &[NewCropRecommendation],
    ) -> Result<Vec<CropRecommendation>>;
    fn list_crop_recommendations(
        &self,
        owner_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CropRecommendation>>;
}
