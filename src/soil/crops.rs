//! Crop catalog and suitability ranking.

use super::models::{CropMatch, SoilProfile, SoilType, WaterRequirement};
use super::models::SoilType::{Clay, Loamy, Sandy};

/// Number of matches returned when the caller does not ask for a limit.
pub const DEFAULT_TOP_N: usize = 5;

/// Minimum suitability a crop needs to be suggested.
pub const MIN_SUITABILITY: u32 = 50;

const PH_IN_RANGE_POINTS: u32 = 40;
const PH_NEAR_RANGE_POINTS: u32 = 25;
const PH_OUT_OF_RANGE_POINTS: u32 = 10;
const PH_TOLERANCE: f64 = 0.5;
const SOIL_TYPE_POINTS: u32 = 30;
const NUTRIENT_POINTS: u32 = 10;

/// Growing requirements of a single crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequirements {
    pub name: &'static str,
    pub ph_min: f64,
    pub ph_max: f64,
    pub soil_types: &'static [SoilType],
    pub water_need: WaterRequirement,
}

impl CropRequirements {
    fn ph_points(&self, ph: f64) -> u32 {
        if self.ph_min <= ph && ph <= self.ph_max {
            PH_IN_RANGE_POINTS
        } else if self.ph_min - PH_TOLERANCE <= ph && ph <= self.ph_max + PH_TOLERANCE {
            PH_NEAR_RANGE_POINTS
        } else {
            PH_OUT_OF_RANGE_POINTS
        }
    }

    /// Additive suitability of this crop for the given profile.
    pub fn suitability(&self, profile: &SoilProfile) -> u32 {
        let mut score = profile.ph_level.map_or(0, |ph| self.ph_points(ph));

        if profile
            .soil_type
            .is_some_and(|soil_type| self.soil_types.contains(&soil_type))
        {
            score += SOIL_TYPE_POINTS;
        }

        let nutrients_met = [
            profile.nitrogen.is_some_and(|n| n >= 30.0),
            profile.phosphorus.is_some_and(|p| p >= 20.0),
            profile.potassium.is_some_and(|k| k >= 120.0),
        ];
        score += NUTRIENT_POINTS * nutrients_met.iter().filter(|met| **met).count() as u32;

        score
    }
}

static BUILTIN_CROPS: [CropRequirements; 10] = [
    CropRequirements {
        name: "Rice",
        ph_min: 5.5,
        ph_max: 7.0,
        soil_types: &[Clay, Loamy],
        water_need: WaterRequirement::High,
    },
    CropRequirements {
        name: "Wheat",
        ph_min: 6.0,
        ph_max: 7.5,
        soil_types: &[Loamy, Clay],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Maize",
        ph_min: 5.8,
        ph_max: 7.8,
        soil_types: &[Loamy, Sandy],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Cotton",
        ph_min: 5.8,
        ph_max: 8.0,
        soil_types: &[Loamy, Clay],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Sugarcane",
        ph_min: 6.0,
        ph_max: 7.5,
        soil_types: &[Loamy, Clay],
        water_need: WaterRequirement::High,
    },
    CropRequirements {
        name: "Soybean",
        ph_min: 6.0,
        ph_max: 7.0,
        soil_types: &[Loamy, Sandy],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Groundnut",
        ph_min: 6.0,
        ph_max: 7.0,
        soil_types: &[Sandy, Loamy],
        water_need: WaterRequirement::Low,
    },
    CropRequirements {
        name: "Tomato",
        ph_min: 6.0,
        ph_max: 7.0,
        soil_types: &[Loamy, Sandy],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Potato",
        ph_min: 5.0,
        ph_max: 6.5,
        soil_types: &[Loamy, Sandy],
        water_need: WaterRequirement::Medium,
    },
    CropRequirements {
        name: "Onion",
        ph_min: 6.0,
        ph_max: 7.5,
        soil_types: &[Loamy, Sandy],
        water_need: WaterRequirement::Medium,
    },
];

const SEASONS: &[(&str, &str)] = &[
    ("Rice", "Kharif (June-July)"),
    ("Wheat", "Rabi (November-December)"),
    ("Maize", "Kharif (June-July)"),
    ("Cotton", "Kharif (April-May)"),
    ("Sugarcane", "Spring (February-March)"),
    ("Soybean", "Kharif (June-July)"),
    ("Groundnut", "Kharif (June-July)"),
    ("Tomato", "Winter (October-November)"),
    ("Potato", "Rabi (October-November)"),
    ("Onion", "Rabi (November-December)"),
];

const UNKNOWN_SEASON: &str = "Consult local expert";

/// Recommended planting season for a crop.
pub fn recommended_season(crop_name: &str) -> &'static str {
    SEASONS
        .iter()
        .find(|(name, _)| *name == crop_name)
        .map_or(UNKNOWN_SEASON, |(_, season)| *season)
}

/// An ordered, read-only set of crops to rank against.
#[derive(Debug, Clone, Copy)]
pub struct CropCatalog<'a> {
    crops: &'a [CropRequirements],
}

impl<'a> CropCatalog<'a> {
    pub fn new(crops: &'a [CropRequirements]) -> Self {
        Self { crops }
    }

    pub fn crops(&self) -> &'a [CropRequirements] {
        self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl CropCatalog<'static> {
    pub fn builtin() -> Self {
        Self::new(&BUILTIN_CROPS)
    }
}

impl Default for CropCatalog<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Ranks the catalog against a profile, best first.
///
/// Only crops reaching [`MIN_SUITABILITY`] are returned, at most `top_n` of
/// them. Equal scores keep catalog order.
pub fn rank(profile: &SoilProfile, catalog: &CropCatalog<'_>, top_n: usize) -> Vec<CropMatch> {
    let mut matches: Vec<CropMatch> = catalog
        .crops()
        .iter()
        .filter_map(|crop| {
            let suitability_score = crop.suitability(profile);
            (suitability_score >= MIN_SUITABILITY).then(|| CropMatch {
                crop_name: crop.name.to_string(),
                suitability_score,
                water_requirement: crop.water_need,
                recommended_season: recommended_season(crop.name).to_string(),
            })
        })
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.suitability_score.cmp(&a.suitability_score));
    matches.truncate(top_n);
    matches
}
