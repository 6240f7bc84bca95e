//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all soil and crop endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// POST with a raw, possibly malformed, JSON body
    pub async fn post_raw(&self, path: &str, body: &str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed")
    }

    /// GET /
    pub async fn status(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Soil Endpoints
    // ========================================================================

    /// POST /v1/soil/analyze
    pub async fn analyze(&self, body: &Value) -> Response {
        self.post_json("/v1/soil/analyze", body).await
    }

    /// Analyzes a sample and returns the stored analysis id
    ///
    /// # Panics
    ///
    /// Panics if the analysis is not created.
    pub async fn analyze_ok(&self, body: &Value) -> i64 {
        let response = self.analyze(body).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Analysis failed: {:?}",
            response.text().await
        );
        let json: Value = response.json().await.expect("Invalid analysis response");
        json["data"]["id"].as_i64().expect("Analysis without id")
    }

    /// GET /v1/soil/history/{user_id}
    pub async fn history(&self, user_id: i64) -> Response {
        self.get(&format!("/v1/soil/history/{}", user_id)).await
    }

    /// GET /v1/soil/history/{user_id}?limit=..&offset=..
    pub async fn history_page(&self, user_id: i64, limit: usize, offset: usize) -> Response {
        self.get(&format!(
            "/v1/soil/history/{}?limit={}&offset={}",
            user_id, limit, offset
        ))
        .await
    }

    /// GET /v1/soil/{analysis_id}
    pub async fn get_analysis(&self, analysis_id: i64) -> Response {
        self.get(&format!("/v1/soil/{}", analysis_id)).await
    }

    /// POST /v1/soil/score
    pub async fn score(&self, profile: &Value) -> Response {
        self.post_json("/v1/soil/score", profile).await
    }

    /// POST /v1/soil/recommendations
    pub async fn recommendations(&self, profile: &Value) -> Response {
        self.post_json("/v1/soil/recommendations", profile).await
    }

    // ========================================================================
    // Crop Endpoints
    // ========================================================================

    /// POST /v1/crops/rank
    pub async fn rank(&self, profile: &Value, top_n: Option<usize>) -> Response {
        let path = match top_n {
            Some(top_n) => format!("/v1/crops/rank?top_n={}", top_n),
            None => "/v1/crops/rank".to_string(),
        };
        self.post_json(&path, profile).await
    }

    /// POST /v1/crops/recommend
    pub async fn recommend_crops(&self, user_id: i64, soil_analysis_id: Option<i64>) -> Response {
        let body = match soil_analysis_id {
            Some(id) => json!({ "user_id": user_id, "soil_analysis_id": id }),
            None => json!({ "user_id": user_id }),
        };
        self.post_json("/v1/crops/recommend", &body).await
    }

    /// POST /v1/crops/recommend with an arbitrary body
    pub async fn recommend_crops_with(&self, body: &Value) -> Response {
        self.post_json("/v1/crops/recommend", body).await
    }

    /// GET /v1/crops/recommendations/{user_id}
    pub async fn crop_recommendations(&self, user_id: i64) -> Response {
        self.get(&format!("/v1/crops/recommendations/{}", user_id))
            .await
    }
}
