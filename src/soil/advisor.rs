//! Detailed crop recommendations built on top of a stored analysis.

use super::models::{CropMatch, NewCropRecommendation, SoilAnalysis};

/// Agronomic details for a crop the advisor knows well.
#[derive(Debug, Clone, PartialEq)]
pub struct Agronomy {
    pub crop_name: &'static str,
    pub variety: &'static str,
    /// Tonnes per hectare.
    pub expected_yield: f64,
    pub planting_season: &'static str,
    pub harvest_time_days: u32,
    pub water_requirement: &'static str,
    pub fertilizer: &'static str,
    pub pest_management: &'static str,
    /// Confidence used when there is no analysis to derive one from.
    pub reference_confidence: f64,
}

pub const AGRONOMY: &[Agronomy] = &[
    Agronomy {
        crop_name: "Rice",
        variety: "Basmati 370",
        expected_yield: 4.5,
        planting_season: "Kharif",
        harvest_time_days: 120,
        water_requirement: "High (1500-2000mm)",
        fertilizer: "NPK 120:60:40 kg/ha",
        pest_management: "Monitor for stem borer, leaf folder. Use IPM practices.",
        reference_confidence: 0.85,
    },
    Agronomy {
        crop_name: "Wheat",
        variety: "HD 2967",
        expected_yield: 3.8,
        planting_season: "Rabi",
        harvest_time_days: 110,
        water_requirement: "Medium (450-650mm)",
        fertilizer: "NPK 150:75:50 kg/ha",
        pest_management: "Watch for aphids, rust diseases. Apply fungicides as needed.",
        reference_confidence: 0.78,
    },
    Agronomy {
        crop_name: "Maize",
        variety: "Pioneer 30V92",
        expected_yield: 5.2,
        planting_season: "Kharif",
        harvest_time_days: 95,
        water_requirement: "Medium (500-800mm)",
        fertilizer: "NPK 180:60:40 kg/ha",
        pest_management: "Control fall armyworm, stem borer. Use pheromone traps.",
        reference_confidence: 0.82,
    },
];

pub fn agronomy_for(crop_name: &str) -> Option<&'static Agronomy> {
    AGRONOMY.iter().find(|a| a.crop_name == crop_name)
}

impl Agronomy {
    fn recommendation(&self, confidence_score: f64) -> NewCropRecommendation {
        NewCropRecommendation {
            crop_name: self.crop_name.to_string(),
            variety: Some(self.variety.to_string()),
            confidence_score,
            expected_yield: Some(self.expected_yield),
            planting_season: Some(self.planting_season.to_string()),
            harvest_time_days: Some(self.harvest_time_days),
            water_requirement: Some(self.water_requirement.to_string()),
            fertilizer_recommendation: Some(self.fertilizer.to_string()),
            pest_management: Some(self.pest_management.to_string()),
        }
    }
}

fn from_match(crop_match: &CropMatch) -> NewCropRecommendation {
    let confidence_score = f64::from(crop_match.suitability_score) / 100.0;
    match agronomy_for(&crop_match.crop_name) {
        Some(agronomy) => agronomy.recommendation(confidence_score),
        None => NewCropRecommendation {
            crop_name: crop_match.crop_name.clone(),
            variety: None,
            confidence_score,
            expected_yield: None,
            planting_season: Some(crop_match.recommended_season.clone()),
            harvest_time_days: None,
            water_requirement: Some(crop_match.water_requirement.as_str().to_string()),
            fertilizer_recommendation: None,
            pest_management: None,
        },
    }
}

/// Builds the crop recommendations for an analysis.
///
/// With no analysis the reference crops are returned in table order.
pub fn advise(analysis: Option<&SoilAnalysis>) -> Vec<NewCropRecommendation> {
    match analysis {
        Some(analysis) => analysis.crop_matches.iter().map(from_match).collect(),
        None => AGRONOMY
            .iter()
            .map(|a| a.recommendation(a.reference_confidence))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::models::{HealthScore, SoilProfile, WaterRequirement};
    use chrono::Utc;

    fn analysis_with(matches: Vec<CropMatch>) -> SoilAnalysis {
        SoilAnalysis {
            id: 1,
            owner_id: 1,
            sample_id: "SOIL_20240101_000000_1000".to_string(),
            location: "Pune".to_string(),
            latitude: None,
            longitude: None,
            profile: SoilProfile::default(),
            health_score: HealthScore::NEUTRAL,
            recommendations: vec![],
            crop_matches: matches,
            created_at: Utc::now(),
        }
    }

    fn crop_match(name: &str, score: u32) -> CropMatch {
        CropMatch {
            crop_name: name.to_string(),
            suitability_score: score,
            water_requirement: WaterRequirement::Low,
            recommended_season: "Kharif (June-July)".to_string(),
        }
    }

    #[test]
    fn without_analysis_returns_reference_crops() {
        let recs = advise(None);
        let summary: Vec<(&str, f64)> = recs
            .iter()
            .map(|r| (r.crop_name.as_str(), r.confidence_score))
            .collect();
        assert_eq!(summary, vec![("Rice", 0.85), ("Wheat", 0.78), ("Maize", 0.82)]);
        assert_eq!(recs[0].variety.as_deref(), Some("Basmati 370"));
        assert_eq!(recs[1].harvest_time_days, Some(110));
        assert_eq!(
            recs[2].fertilizer_recommendation.as_deref(),
            Some("NPK 180:60:40 kg/ha")
        );
    }

    #[test]
    fn known_crops_are_joined_with_agronomy() {
        let analysis = analysis_with(vec![crop_match("Wheat", 90)]);
        let recs = advise(Some(&analysis));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].confidence_score, 0.9);
        assert_eq!(recs[0].variety.as_deref(), Some("HD 2967"));
        assert_eq!(recs[0].planting_season.as_deref(), Some("Rabi"));
    }

    #[test]
    fn unknown_crops_keep_match_fields_only() {
        let analysis = analysis_with(vec![crop_match("Groundnut", 70), crop_match("Rice", 55)]);
        let recs = advise(Some(&analysis));
        assert_eq!(recs[0].crop_name, "Groundnut");
        assert_eq!(recs[0].confidence_score, 0.7);
        assert_eq!(recs[0].variety, None);
        assert_eq!(recs[0].water_requirement.as_deref(), Some("low"));
        assert_eq!(recs[0].planting_season.as_deref(), Some("Kharif (June-July)"));
        assert_eq!(recs[1].crop_name, "Rice");
    }

    #[test]
    fn analysis_without_matches_yields_nothing() {
        assert!(advise(Some(&analysis_with(vec![]))).is_empty());
    }
}
