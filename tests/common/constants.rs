//! Shared constants for end-to-end tests
//!
//! When sample data changes, update only this file.

use serde_json::{json, Value};

// ============================================================================
// Test Owners
// ============================================================================

/// Owner used by most tests
pub const OWNER_ID: i64 = 101;

/// Owner that never submits anything
pub const OTHER_OWNER_ID: i64 = 202;

/// Field location of the sample fixtures
pub const TEST_LOCATION: &str = "North field, plot 7";

// ============================================================================
// Sample Bodies
// ============================================================================

/// A fully measured loamy sample sitting in every optimal band.
///
/// Nothing is gap-filled, so scores and matches are deterministic.
pub fn optimal_sample(owner_id: i64) -> Value {
    json!({
        "user_id": owner_id,
        "location": TEST_LOCATION,
        "latitude": 18.52,
        "longitude": 73.85,
        "ph_level": 6.5,
        "nitrogen": 45,
        "phosphorus": 30,
        "potassium": 160,
        "organic_matter": 3.5,
        "moisture_content": 25,
        "electrical_conductivity": 0.8,
        "soil_type": "Loamy"
    })
}

/// A fully measured acidic, depleted sample.
pub fn acidic_sample(owner_id: i64) -> Value {
    json!({
        "user_id": owner_id,
        "location": TEST_LOCATION,
        "ph_level": "5.0",
        "nitrogen": 10,
        "phosphorus": 5,
        "potassium": 50,
        "organic_matter": 1.0,
        "moisture_content": 10,
        "electrical_conductivity": 0.3,
        "soil_type": "Sandy"
    })
}

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Seed of the server's gap-filling generator
pub const RNG_SEED: u64 = 20240601;

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
