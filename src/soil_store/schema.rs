//! SQLite schema for the soil database.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyAction, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Soil analyses
// =============================================================================

/// One row per analyzed sample. Recommendations and crop matches are JSON arrays.
const SOIL_ANALYSES_TABLE_V1: Table = Table {
    name: "soil_analyses",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", SqlType::Integer, non_null = true),
        sqlite_column!("sample_id", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("location", SqlType::Text, non_null = true),
        sqlite_column!("latitude", SqlType::Real),
        sqlite_column!("longitude", SqlType::Real),
        sqlite_column!("ph_level", SqlType::Real),
        sqlite_column!("nitrogen", SqlType::Real),
        sqlite_column!("phosphorus", SqlType::Real),
        sqlite_column!("potassium", SqlType::Real),
        sqlite_column!("organic_matter", SqlType::Real),
        sqlite_column!("moisture_content", SqlType::Real),
        sqlite_column!("electrical_conductivity", SqlType::Real),
        sqlite_column!("soil_type", SqlType::Text),
        sqlite_column!("health_score", SqlType::Real, non_null = true),
        sqlite_column!("recommendations", SqlType::Text, non_null = true),
        sqlite_column!("crop_matches", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_soil_analyses_user_created", "user_id, created_at DESC")],
};

// =============================================================================
// Version 2 - Crop recommendations
// =============================================================================

const SOIL_ANALYSIS_FK: ForeignKey = ForeignKey {
    foreign_table: "soil_analyses",
    foreign_column: "id",
    on_delete: ForeignKeyAction::SetNull,
};

const CROP_RECOMMENDATIONS_TABLE_V2: Table = Table {
    name: "crop_recommendations",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", SqlType::Integer, non_null = true),
        sqlite_column!(
            "soil_analysis_id",
            SqlType::Integer,
            foreign_key = Some(&SOIL_ANALYSIS_FK)
        ),
        sqlite_column!("crop_name", SqlType::Text, non_null = true),
        sqlite_column!("variety", SqlType::Text),
        sqlite_column!("confidence_score", SqlType::Real, non_null = true),
        sqlite_column!("expected_yield", SqlType::Real),
        sqlite_column!("planting_season", SqlType::Text),
        sqlite_column!("harvest_time_days", SqlType::Integer),
        sqlite_column!("water_requirement", SqlType::Text),
        sqlite_column!("fertilizer_recommendation", SqlType::Text),
        sqlite_column!("pest_management", SqlType::Text),
        sqlite_column!("created_at", SqlType::Text, non_null = true),
    ],
    indices: &[(
        "idx_crop_recommendations_user_created",
        "user_id, created_at DESC",
    )],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    CROP_RECOMMENDATIONS_TABLE_V2.create(conn)
}

pub const SOIL_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[SOIL_ANALYSES_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[SOIL_ANALYSES_TABLE_V1, CROP_RECOMMENDATIONS_TABLE_V2],
        migration: Some(migrate_v1_to_v2),
    },
];
