//! Soil analysis models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Texture class of a soil sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Loamy,
    Clay,
    Sandy,
    Silty,
}

impl SoilType {
    pub const ALL: [SoilType; 4] = [
        SoilType::Loamy,
        SoilType::Clay,
        SoilType::Sandy,
        SoilType::Silty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Loamy => "Loamy",
            SoilType::Clay => "Clay",
            SoilType::Sandy => "Sandy",
            SoilType::Silty => "Silty",
        }
    }

    /// Case-insensitive parse, surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        SoilType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured soil properties of a single sample.
///
/// Every field is optional. The engines skip absent fields instead of
/// treating them as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilProfile {
    pub ph_level: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub organic_matter: Option<f64>,
    pub moisture_content: Option<f64>,
    pub electrical_conductivity: Option<f64>,
    pub soil_type: Option<SoilType>,
}

/// Aggregate soil health indicator, always carrying one decimal of precision.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthScore(f64);

impl HealthScore {
    /// Score used when no factor could be evaluated.
    pub const NEUTRAL: HealthScore = HealthScore(50.0);

    /// Builds a score rounding to one decimal, ties to even.
    pub fn from_raw(raw: f64) -> Self {
        HealthScore((raw * 10.0).round_ties_even() / 10.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for HealthScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    #[serde(rename = "pH_adjustment")]
    PhAdjustment,
    #[serde(rename = "organic_matter")]
    OrganicMatter,
    #[serde(rename = "nitrogen")]
    Nitrogen,
    #[serde(rename = "phosphorus")]
    Phosphorus,
    #[serde(rename = "potassium")]
    Potassium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

/// A single soil improvement action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub category: RecommendationCategory,
    pub issue: String,
    #[serde(rename = "recommendation")]
    pub action: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterRequirement {
    Low,
    Medium,
    High,
}

impl WaterRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterRequirement::Low => "low",
            WaterRequirement::Medium => "medium",
            WaterRequirement::High => "high",
        }
    }
}

/// A crop that fits a soil profile well enough to be suggested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropMatch {
    pub crop_name: String,
    pub suitability_score: u32,
    pub water_requirement: WaterRequirement,
    pub recommended_season: String,
}

/// Output of one orchestrated analysis, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub owner_id: i64,
    pub sample_id: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub profile: SoilProfile,
    pub health_score: HealthScore,
    pub recommendations: Vec<Recommendation>,
    pub crop_matches: Vec<CropMatch>,
}

/// A persisted analysis snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilAnalysis {
    pub id: i64,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
    pub sample_id: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub profile: SoilProfile,
    pub health_score: HealthScore,
    pub recommendations: Vec<Recommendation>,
    #[serde(rename = "suitable_crops")]
    pub crop_matches: Vec<CropMatch>,
    pub created_at: DateTime<Utc>,
}

/// Detailed crop recommendation to be stored for an owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCropRecommendation {
    pub crop_name: String,
    pub variety: Option<String>,
    pub confidence_score: f64,
    pub expected_yield: Option<f64>,
    pub planting_season: Option<String>,
    pub harvest_time_days: Option<u32>,
    pub water_requirement: Option<String>,
    pub fertilizer_recommendation: Option<String>,
    pub pest_management: Option<String>,
}

/// A persisted crop recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRecommendation {
    pub id: i64,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
    pub soil_analysis_id: Option<i64>,
    #[serde(flatten)]
    pub details: NewCropRecommendation,
    pub created_at: DateTime<Utc>,
}
