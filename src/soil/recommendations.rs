//! Soil improvement recommendations.

use super::models::{Priority, Recommendation, RecommendationCategory, SoilProfile};

struct Rule {
    category: RecommendationCategory,
    issue: &'static str,
    action: &'static str,
    priority: Priority,
    applies: fn(&SoilProfile) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        category: RecommendationCategory::PhAdjustment,
        issue: "Soil is too acidic",
        action: "Apply lime to increase pH. Add 2-3 tons of agricultural lime per hectare.",
        priority: Priority::High,
        applies: |p: &SoilProfile| p.ph_level.is_some_and(|ph| ph < 6.0),
    },
    Rule {
        category: RecommendationCategory::PhAdjustment,
        issue: "Soil is too alkaline",
        action: "Apply sulfur or organic matter to decrease pH. Add 500-1000 kg sulfur per hectare.",
        priority: Priority::High,
        applies: |p: &SoilProfile| p.ph_level.is_some_and(|ph| ph > 7.5),
    },
    Rule {
        category: RecommendationCategory::OrganicMatter,
        issue: "Low organic matter content",
        action: "Add compost, farmyard manure, or green manure. Apply 10-15 tons per hectare.",
        priority: Priority::Medium,
        applies: |p: &SoilProfile| p.organic_matter.is_some_and(|om| om < 2.0),
    },
    Rule {
        category: RecommendationCategory::Nitrogen,
        issue: "Nitrogen deficiency",
        action: "Apply nitrogen-rich fertilizers like urea or ammonium sulfate. Consider legume cover crops.",
        priority: Priority::High,
        applies: |p: &SoilProfile| p.nitrogen.is_some_and(|n| n < 30.0),
    },
    Rule {
        category: RecommendationCategory::Phosphorus,
        issue: "Phosphorus deficiency",
        action: "Apply phosphate fertilizers like DAP or rock phosphate.",
        priority: Priority::Medium,
        applies: |p: &SoilProfile| p.phosphorus.is_some_and(|ph| ph < 20.0),
    },
    Rule {
        category: RecommendationCategory::Potassium,
        issue: "Potassium deficiency",
        action: "Apply potash fertilizers like muriate of potash or sulfate of potash.",
        priority: Priority::Medium,
        applies: |p: &SoilProfile| p.potassium.is_some_and(|k| k < 120.0),
    },
];

/// Returns the remediation actions triggered by a profile, in rule order.
pub fn recommend(profile: &SoilProfile) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter(|rule| (rule.applies)(profile))
        .map(|rule| Recommendation {
            category: rule.category,
            issue: rule.issue.to_string(),
            action: rule.action.to_string(),
            priority: rule.priority,
        })
        .collect()
}
