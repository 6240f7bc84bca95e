mod advisor;
mod analyzer;
mod crops;
mod models;
mod recommendations;
mod scoring;
mod validation;

pub use advisor::{advise, agronomy_for, Agronomy, AGRONOMY};
pub use analyzer::{
    analyze_soil, fill_gaps, format_sample_id, rank_crops, recommend_only, score_only,
    AnalyzeSoilInput, RawSoilProfile, SampleIdGenerator, SoilAnalyzer, TimestampSampleIds,
};
pub use crops::{
    rank, recommended_season, CropCatalog, CropRequirements, DEFAULT_TOP_N, MIN_SUITABILITY,
};
pub use models::*;
pub use recommendations::recommend;
pub use scoring::score;
pub use validation::{check_range, coerce_integer, ValidationError, ValidationResult};
