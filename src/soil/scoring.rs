//! Soil health scoring.
//!
//! Each factor awards up to 25 points and the final score is the average
//! over the factors that could be evaluated, so a fully optimal sample
//! scores 25.0 rather than 100.

use super::models::{HealthScore, SoilProfile};

const OPTIMAL_POINTS: f64 = 25.0;
const ACCEPTABLE_POINTS: f64 = 20.0;
const POOR_POINTS: f64 = 10.0;

const NITROGEN_POINTS: f64 = 8.0;
const PHOSPHORUS_POINTS: f64 = 8.0;
const POTASSIUM_POINTS: f64 = 9.0;

fn ph_points(ph: f64) -> f64 {
    if (6.0..=7.5).contains(&ph) {
        OPTIMAL_POINTS
    } else if (5.5..=8.0).contains(&ph) {
        ACCEPTABLE_POINTS
    } else {
        POOR_POINTS
    }
}

fn organic_matter_points(organic_matter: f64) -> f64 {
    if organic_matter >= 3.0 {
        OPTIMAL_POINTS
    } else if organic_matter >= 2.0 {
        ACCEPTABLE_POINTS
    } else {
        POOR_POINTS
    }
}

/// Returns `None` when none of the three nutrients was measured.
fn npk_points(profile: &SoilProfile) -> Option<f64> {
    if profile.nitrogen.is_none() && profile.phosphorus.is_none() && profile.potassium.is_none() {
        return None;
    }

    let mut points = 0.0;
    if profile.nitrogen.is_some_and(|n| n >= 40.0) {
        points += NITROGEN_POINTS;
    }
    if profile.phosphorus.is_some_and(|p| p >= 25.0) {
        points += PHOSPHORUS_POINTS;
    }
    if profile.potassium.is_some_and(|k| k >= 150.0) {
        points += POTASSIUM_POINTS;
    }
    Some(points)
}

fn moisture_points(moisture: f64) -> f64 {
    if (20.0..=30.0).contains(&moisture) {
        OPTIMAL_POINTS
    } else if (15.0..=35.0).contains(&moisture) {
        ACCEPTABLE_POINTS
    } else {
        POOR_POINTS
    }
}

/// Computes the health score of a soil profile.
pub fn score(profile: &SoilProfile) -> HealthScore {
    let factors = [
        profile.ph_level.map(ph_points),
        profile.organic_matter.map(organic_matter_points),
        npk_points(profile),
        profile.moisture_content.map(moisture_points),
    ];

    let (total, evaluated) = factors
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(total, count), points| {
            (total + points, count + 1)
        });

    if evaluated == 0 {
        return HealthScore::NEUTRAL;
    }
    HealthScore::from_raw(total / evaluated as f64)
}
