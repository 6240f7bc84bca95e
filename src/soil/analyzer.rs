//! Analysis orchestration: validation, gap-filling and the scoring pipeline.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::crops::{rank, CropCatalog, DEFAULT_TOP_N};
use super::models::{AnalysisResult, CropMatch, HealthScore, Recommendation, SoilProfile, SoilType};
use super::recommendations::recommend;
use super::scoring::score;
use super::validation::{
    coerce_integer, coerce_number, parse_soil_type, require_text, ValidationError,
    ValidationResult,
};

/// Soil measurements as received over the wire.
///
/// Numbers may arrive as JSON numbers or numeric strings; nothing is
/// interpreted until [`RawSoilProfile::validate`] runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSoilProfile {
    pub ph_level: Option<Value>,
    pub nitrogen: Option<Value>,
    pub phosphorus: Option<Value>,
    pub potassium: Option<Value>,
    pub organic_matter: Option<Value>,
    pub moisture_content: Option<Value>,
    pub electrical_conductivity: Option<Value>,
    pub soil_type: Option<String>,
}

impl RawSoilProfile {
    fn coerce_measurements(&self) -> ValidationResult<SoilProfile> {
        Ok(SoilProfile {
            ph_level: coerce_number("ph_level", self.ph_level.as_ref())?,
            nitrogen: coerce_number("nitrogen", self.nitrogen.as_ref())?,
            phosphorus: coerce_number("phosphorus", self.phosphorus.as_ref())?,
            potassium: coerce_number("potassium", self.potassium.as_ref())?,
            organic_matter: coerce_number("organic_matter", self.organic_matter.as_ref())?,
            moisture_content: coerce_number("moisture_content", self.moisture_content.as_ref())?,
            electrical_conductivity: coerce_number(
                "electrical_conductivity",
                self.electrical_conductivity.as_ref(),
            )?,
            soil_type: None,
        })
    }

    /// Produces a typed profile. Absent fields stay absent.
    pub fn validate(&self) -> ValidationResult<SoilProfile> {
        let mut profile = self.coerce_measurements()?;
        profile.soil_type = parse_soil_type(self.soil_type.as_deref())?;
        Ok(profile)
    }
}

/// Body of an analysis request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeSoilInput {
    pub user_id: Option<Value>,
    pub location: Option<String>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    #[serde(flatten)]
    pub measurements: RawSoilProfile,
}

/// Source of sample identifiers.
pub trait SampleIdGenerator: Send + Sync {
    fn next_sample_id(&self, rng: &mut dyn RngCore) -> String;
}

const SAMPLE_SUFFIX_MIN: u32 = 1000;
const SAMPLE_SUFFIX_MAX: u32 = 9999;

pub fn format_sample_id(at: DateTime<Utc>, suffix: u32) -> String {
    format!("SOIL_{}_{}", at.format("%Y%m%d_%H%M%S"), suffix)
}

/// Builds `SOIL_<YYYYmmdd_HHMMSS>_<NNNN>` ids from the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampSampleIds;

impl SampleIdGenerator for TimestampSampleIds {
    fn next_sample_id(&self, rng: &mut dyn RngCore) -> String {
        let suffix = rng.random_range(SAMPLE_SUFFIX_MIN..=SAMPLE_SUFFIX_MAX);
        format_sample_id(Utc::now(), suffix)
    }
}

/// Interval a missing measurement is drawn from.
struct GapRange {
    min: f64,
    max: f64,
    decimals: i32,
}

impl GapRange {
    const fn new(min: f64, max: f64, decimals: i32) -> Self {
        Self { min, max, decimals }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let factor = 10f64.powi(self.decimals);
        (rng.random_range(self.min..=self.max) * factor).round_ties_even() / factor
    }
}

const PH_GAP: GapRange = GapRange::new(5.5, 8.5, 1);
const NITROGEN_GAP: GapRange = GapRange::new(20.0, 80.0, 1);
const PHOSPHORUS_GAP: GapRange = GapRange::new(10.0, 50.0, 1);
const POTASSIUM_GAP: GapRange = GapRange::new(100.0, 300.0, 1);
const ORGANIC_MATTER_GAP: GapRange = GapRange::new(1.5, 4.5, 1);
const MOISTURE_GAP: GapRange = GapRange::new(15.0, 35.0, 1);
const CONDUCTIVITY_GAP: GapRange = GapRange::new(0.2, 2.0, 2);

/// Fills every absent measurement with a plausible random value.
///
/// Returns the names of the fields that were filled.
pub fn fill_gaps<R: Rng + ?Sized>(profile: &mut SoilProfile, rng: &mut R) -> Vec<&'static str> {
    let mut filled = Vec::new();
    let slots = [
        ("ph_level", &mut profile.ph_level, &PH_GAP),
        ("nitrogen", &mut profile.nitrogen, &NITROGEN_GAP),
        ("phosphorus", &mut profile.phosphorus, &PHOSPHORUS_GAP),
        ("potassium", &mut profile.potassium, &POTASSIUM_GAP),
        ("organic_matter", &mut profile.organic_matter, &ORGANIC_MATTER_GAP),
        ("moisture_content", &mut profile.moisture_content, &MOISTURE_GAP),
        (
            "electrical_conductivity",
            &mut profile.electrical_conductivity,
            &CONDUCTIVITY_GAP,
        ),
    ];
    for (name, slot, range) in slots {
        if slot.is_none() {
            *slot = Some(range.draw(rng));
            filled.push(name);
        }
    }

    if profile.soil_type.is_none() {
        let index = rng.random_range(0..SoilType::ALL.len());
        profile.soil_type = Some(SoilType::ALL[index]);
        filled.push("soil_type");
    }
    filled
}

/// Runs the full analysis pipeline against a crop catalog.
#[derive(Debug, Clone, Copy)]
pub struct SoilAnalyzer {
    catalog: CropCatalog<'static>,
    top_n: usize,
}

impl Default for SoilAnalyzer {
    fn default() -> Self {
        Self::new(CropCatalog::builtin(), DEFAULT_TOP_N)
    }
}

impl SoilAnalyzer {
    pub fn new(catalog: CropCatalog<'static>, top_n: usize) -> Self {
        Self { catalog, top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn catalog(&self) -> &CropCatalog<'static> {
        &self.catalog
    }

    /// Validates the input, fills measurement gaps and evaluates the sample.
    ///
    /// All coercion errors are reported before missing identification
    /// fields. Nothing here is persisted.
    pub fn analyze<R: Rng>(
        &self,
        input: &AnalyzeSoilInput,
        rng: &mut R,
        sample_ids: &dyn SampleIdGenerator,
    ) -> ValidationResult<AnalysisResult> {
        let mut profile = input.measurements.validate()?;
        let owner_id = coerce_integer("user_id", input.user_id.as_ref())?;
        let latitude = coerce_number("latitude", input.latitude.as_ref())?;
        let longitude = coerce_number("longitude", input.longitude.as_ref())?;

        let owner_id = owner_id.ok_or(ValidationError::MissingField("user_id"))?;
        let location = require_text("location", input.location.as_deref())?.to_string();

        let filled = fill_gaps(&mut profile, rng);
        let sample_id = sample_ids.next_sample_id(rng);
        debug!(
            "Analyzing sample {} for owner {}, gap-filled: {:?}",
            sample_id, owner_id, filled
        );

        let (health_score, recommendations, crop_matches) = self.evaluate(&profile);

        Ok(AnalysisResult {
            owner_id,
            sample_id,
            location,
            latitude,
            longitude,
            profile,
            health_score,
            recommendations,
            crop_matches,
        })
    }

    /// Scores, recommends and ranks a profile as-is.
    pub fn evaluate(&self, profile: &SoilProfile) -> (HealthScore, Vec<Recommendation>, Vec<CropMatch>) {
        (
            score(profile),
            recommend(profile),
            rank(profile, &self.catalog, self.top_n),
        )
    }
}

/// Analyzes a sample against the built-in catalog.
pub fn analyze_soil<R: Rng>(
    input: &AnalyzeSoilInput,
    rng: &mut R,
    sample_ids: &dyn SampleIdGenerator,
) -> ValidationResult<AnalysisResult> {
    SoilAnalyzer::default().analyze(input, rng, sample_ids)
}

pub fn score_only(raw: &RawSoilProfile) -> ValidationResult<HealthScore> {
    Ok(score(&raw.validate()?))
}

pub fn recommend_only(raw: &RawSoilProfile) -> ValidationResult<Vec<Recommendation>> {
    Ok(recommend(&raw.validate()?))
}

pub fn rank_crops(raw: &RawSoilProfile, top_n: usize) -> ValidationResult<Vec<CropMatch>> {
    Ok(rank(&raw.validate()?, &CropCatalog::builtin(), top_n))
}
