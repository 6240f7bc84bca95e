use super::schema::SOIL_VERSIONED_SCHEMAS;
use super::{DuplicateSampleId, SoilStore};
use crate::soil::{
    AnalysisResult, CropRecommendation, HealthScore, NewCropRecommendation, SoilAnalysis,
    SoilProfile, SoilType,
};
use crate::sqlite_persistence::open_versioned;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{ffi, params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const ANALYSIS_COLUMNS: &str = "id, user_id, sample_id, location, latitude, longitude, \
     ph_level, nitrogen, phosphorus, potassium, organic_matter, moisture_content, \
     electrical_conductivity, soil_type, health_score, recommendations, crop_matches, created_at";

const CROP_RECOMMENDATION_COLUMNS: &str = "id, user_id, soil_analysis_id, crop_name, variety, \
     confidence_score, expected_yield, planting_season, harvest_time_days, water_requirement, \
     fertilizer_recommendation, pest_management, created_at";

pub struct SqliteSoilStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSoilStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, SOIL_VERSIONED_SCHEMAS, "soil")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fixed-width timestamps so that text ordering matches time ordering.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn parse_json<T: serde::de::DeserializeOwned>(
        row: &rusqlite::Row,
        column: &str,
    ) -> rusqlite::Result<T> {
        let raw: String = row.get(column)?;
        serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    }

    fn row_to_analysis(row: &rusqlite::Row) -> rusqlite::Result<SoilAnalysis> {
        let soil_type = row
            .get::<_, Option<String>>("soil_type")?
            .map(|raw| {
                SoilType::parse(&raw).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        format!("unknown soil type {}", raw).into(),
                    )
                })
            })
            .transpose()?;
        let created_at: String = row.get("created_at")?;

        Ok(SoilAnalysis {
            id: row.get("id")?,
            owner_id: row.get("user_id")?,
            sample_id: row.get("sample_id")?,
            location: row.get("location")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            profile: SoilProfile {
                ph_level: row.get("ph_level")?,
                nitrogen: row.get("nitrogen")?,
                phosphorus: row.get("phosphorus")?,
                potassium: row.get("potassium")?,
                organic_matter: row.get("organic_matter")?,
                moisture_content: row.get("moisture_content")?,
                electrical_conductivity: row.get("electrical_conductivity")?,
                soil_type,
            },
            health_score: HealthScore::from_raw(row.get("health_score")?),
            recommendations: Self::parse_json(row, "recommendations")?,
            crop_matches: Self::parse_json(row, "crop_matches")?,
            created_at: Self::parse_datetime(&created_at),
        })
    }

    fn row_to_crop_recommendation(row: &rusqlite::Row) -> rusqlite::Result<CropRecommendation> {
        let created_at: String = row.get("created_at")?;
        Ok(CropRecommendation {
            id: row.get("id")?,
            owner_id: row.get("user_id")?,
            soil_analysis_id: row.get("soil_analysis_id")?,
            details: NewCropRecommendation {
                crop_name: row.get("crop_name")?,
                variety: row.get("variety")?,
                confidence_score: row.get("confidence_score")?,
                expected_yield: row.get("expected_yield")?,
                planting_season: row.get("planting_season")?,
                harvest_time_days: row.get("harvest_time_days")?,
                water_requirement: row.get("water_requirement")?,
                fertilizer_recommendation: row.get("fertilizer_recommendation")?,
                pest_management: row.get("pest_management")?,
            },
            created_at: Self::parse_datetime(&created_at),
        })
    }
}

impl SoilStore for SqliteSoilStore {
    fn create_analysis(&self, analysis: &AnalysisResult) -> Result<SoilAnalysis> {
        let recommendations = serde_json::to_string(&analysis.recommendations)?;
        let crop_matches = serde_json::to_string(&analysis.crop_matches)?;
        let created_at = Self::now();
        let profile = &analysis.profile;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO soil_analyses ({}) VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                ANALYSIS_COLUMNS
            ),
            params![
                analysis.owner_id,
                analysis.sample_id,
                analysis.location,
                analysis.latitude,
                analysis.longitude,
                profile.ph_level,
                profile.nitrogen,
                profile.phosphorus,
                profile.potassium,
                profile.organic_matter,
                profile.moisture_content,
                profile.electrical_conductivity,
                profile.soil_type.map(|t| t.as_str()),
                analysis.health_score.value(),
                recommendations,
                crop_matches,
                Self::format_datetime(&created_at),
            ],
        )
        .map_err(|err| match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                anyhow::Error::new(DuplicateSampleId(analysis.sample_id.clone()))
            }
            err => anyhow::Error::new(err)
                .context(format!("Failed to store soil analysis {}", analysis.sample_id)),
        })?;
        let id = conn.last_insert_rowid();
        debug!("Stored soil analysis {} as id {}", analysis.sample_id, id);

        Ok(SoilAnalysis {
            id,
            owner_id: analysis.owner_id,
            sample_id: analysis.sample_id.clone(),
            location: analysis.location.clone(),
            latitude: analysis.latitude,
            longitude: analysis.longitude,
            profile: analysis.profile.clone(),
            health_score: analysis.health_score,
            recommendations: analysis.recommendations.clone(),
            crop_matches: analysis.crop_matches.clone(),
            created_at,
        })
    }

    fn get_analysis(&self, id: i64) -> Result<Option<SoilAnalysis>> {
        let conn = self.conn.lock().unwrap();
        let analysis = conn
            .query_row(
                &format!("SELECT {} FROM soil_analyses WHERE id = ?1", ANALYSIS_COLUMNS),
                params![id],
                Self::row_to_analysis,
            )
            .optional()?;
        Ok(analysis)
    }

    fn get_latest_analysis(&self, owner_id: i64) -> Result<Option<SoilAnalysis>> {
        let conn = self.conn.lock().unwrap();
        let analysis = conn
            .query_row(
                &format!(
                    "SELECT {} FROM soil_analyses WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
                    ANALYSIS_COLUMNS
                ),
                params![owner_id],
                Self::row_to_analysis,
            )
            .optional()?;
        Ok(analysis)
    }

    fn list_analyses_by_owner(
        &self,
        owner_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SoilAnalysis>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM soil_analyses WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            ANALYSIS_COLUMNS
        ))?;
        let analyses = stmt
            .query_map(
                params![owner_id, limit as i64, offset as i64],
                Self::row_to_analysis,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(analyses)
    }

    fn add_crop_recommendations(
        &self,
        owner_id: i64,
        soil_analysis_id: Option<i64>,
        recommendations: &[NewCropRecommendation],
    ) -> Result<Vec<CropRecommendation>> {
        let created_at = Self::now();
        let created_at_str = Self::format_datetime(&created_at);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(recommendations.len());
        for rec in recommendations {
            tx.execute(
                &format!(
                    "INSERT INTO crop_recommendations ({}) VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    CROP_RECOMMENDATION_COLUMNS
                ),
                params![
                    owner_id,
                    soil_analysis_id,
                    rec.crop_name,
                    rec.variety,
                    rec.confidence_score,
                    rec.expected_yield,
                    rec.planting_season,
                    rec.harvest_time_days,
                    rec.water_requirement,
                    rec.fertilizer_recommendation,
                    rec.pest_management,
                    created_at_str,
                ],
            )
            .with_context(|| format!("Failed to store crop recommendation {}", rec.crop_name))?;
            stored.push(CropRecommendation {
                id: tx.last_insert_rowid(),
                owner_id,
                soil_analysis_id,
                details: rec.clone(),
                created_at,
            });
        }
        tx.commit()?;
        debug!(
            "Stored {} crop recommendations for owner {}",
            stored.len(),
            owner_id
        );
        Ok(stored)
    }

    fn list_crop_recommendations(
        &self,
        owner_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CropRecommendation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM crop_recommendations WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            CROP_RECOMMENDATION_COLUMNS
        ))?;
        let recommendations = stmt
            .query_map(
                params![owner_id, limit as i64, offset as i64],
                Self::row_to_crop_recommendation,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::{advise, CropMatch, Priority, Recommendation, RecommendationCategory, WaterRequirement};
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteSoilStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSoilStore::new(temp_dir.path().join("soil.db")).unwrap();
        (store, temp_dir)
    }

    fn analysis(owner_id: i64, sample_id: &str) -> AnalysisResult {
        AnalysisResult {
            owner_id,
            sample_id: sample_id.to_string(),
            location: "Nashik".to_string(),
            latitude: Some(19.99),
            longitude: None,
            profile: SoilProfile {
                ph_level: Some(5.4),
                nitrogen: Some(25.0),
                phosphorus: Some(30.0),
                potassium: Some(150.0),
                organic_matter: Some(2.5),
                moisture_content: Some(22.0),
                electrical_conductivity: Some(0.45),
                soil_type: Some(SoilType::Clay),
            },
            health_score: HealthScore::from_raw(19.25),
            recommendations: vec![Recommendation {
                category: RecommendationCategory::PhAdjustment,
                issue: "Soil is too acidic".to_string(),
                action: "Apply lime".to_string(),
                priority: Priority::High,
            }],
            crop_matches: vec![CropMatch {
                crop_name: "Rice".to_string(),
                suitability_score: 65,
                water_requirement: WaterRequirement::High,
                recommended_season: "Kharif (June-July)".to_string(),
            }],
        }
    }

    #[test]
    fn created_analysis_round_trips() {
        let (store, _tmp) = create_tmp_store();
        let created = store.create_analysis(&analysis(1, "SOIL_A")).unwrap();
        let fetched = store.get_analysis(created.id).unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.health_score.value(), 19.2);
        assert_eq!(fetched.profile.soil_type, Some(SoilType::Clay));
    }

    #[test]
    fn missing_analysis_is_none() {
        let (store, _tmp) = create_tmp_store();
        assert!(store.get_analysis(42).unwrap().is_none());
        assert!(store.get_latest_analysis(1).unwrap().is_none());
    }

    #[test]
    fn sample_ids_are_unique() {
        let (store, _tmp) = create_tmp_store();
        store.create_analysis(&analysis(1, "SOIL_DUP")).unwrap();
        let err = store.create_analysis(&analysis(2, "SOIL_DUP")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DuplicateSampleId>(),
            Some(&DuplicateSampleId("SOIL_DUP".to_string()))
        );
        assert_eq!(store.list_analyses_by_owner(2, 10, 0).unwrap().len(), 0);
    }

    #[test]
    fn history_is_newest_first_and_paginated() {
        let (store, _tmp) = create_tmp_store();
        for i in 0..5 {
            store
                .create_analysis(&analysis(7, &format!("SOIL_{}", i)))
                .unwrap();
        }
        store.create_analysis(&analysis(8, "SOIL_OTHER")).unwrap();

        let all = store.list_analyses_by_owner(7, 10, 0).unwrap();
        let samples: Vec<&str> = all.iter().map(|a| a.sample_id.as_str()).collect();
        assert_eq!(samples, vec!["SOIL_4", "SOIL_3", "SOIL_2", "SOIL_1", "SOIL_0"]);

        let page = store.list_analyses_by_owner(7, 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sample_id, "SOIL_2");

        let latest = store.get_latest_analysis(7).unwrap().unwrap();
        assert_eq!(latest.sample_id, "SOIL_4");
        assert!(store.list_analyses_by_owner(99, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn crop_recommendations_are_stored_and_listed() {
        let (store, _tmp) = create_tmp_store();
        let stored_analysis = store.create_analysis(&analysis(3, "SOIL_C")).unwrap();
        let recs = advise(Some(&stored_analysis));

        let stored = store
            .add_crop_recommendations(3, Some(stored_analysis.id), &recs)
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].soil_analysis_id, Some(stored_analysis.id));
        assert_eq!(stored[0].details.confidence_score, 0.65);

        let listed = store.list_crop_recommendations(3, 10, 0).unwrap();
        assert_eq!(listed, stored);
        assert_eq!(listed[0].details.variety.as_deref(), Some("Basmati 370"));
    }

    #[test]
    fn crop_recommendations_without_analysis() {
        let (store, _tmp) = create_tmp_store();
        let stored = store.add_crop_recommendations(4, None, &advise(None)).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|r| r.soil_analysis_id.is_none()));
        assert_eq!(store.list_crop_recommendations(4, 2, 0).unwrap().len(), 2);
    }

    #[test]
    fn failed_batch_stores_nothing() {
        let (store, _tmp) = create_tmp_store();
        let recs = advise(None);
        // no analysis with this id, the foreign key rejects the first insert
        assert!(store.add_crop_recommendations(5, Some(999), &recs).is_err());
        assert!(store.list_crop_recommendations(5, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("soil.db");
        let id = {
            let store = SqliteSoilStore::new(&path).unwrap();
            store.create_analysis(&analysis(1, "SOIL_P")).unwrap().id
        };
        let store = SqliteSoilStore::new(&path).unwrap();
        assert_eq!(store.get_analysis(id).unwrap().unwrap().sample_id, "SOIL_P");
    }
}
