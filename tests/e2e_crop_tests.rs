//! End-to-end tests for crop endpoints
//!
//! Tests ranking, advisor recommendations and their persistence.

mod common;

use common::{optimal_sample, TestClient, TestServer, OTHER_OWNER_ID, OWNER_ID};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn crop_names(crops: &Value) -> Vec<String> {
    crops
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["crop_name"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Rank Tests
// =============================================================================

#[tokio::test]
async fn test_rank_defaults_to_five_matches() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile = json!({
        "ph_level": 6.5,
        "nitrogen": 50,
        "phosphorus": 30,
        "potassium": 150,
        "soil_type": "Loamy"
    });
    let response = client.rank(&profile, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    let crops = &json["suitable_crops"];
    assert_eq!(crops.as_array().unwrap().len(), 5);
    assert_eq!(crops[0]["crop_name"], "Rice");
    assert_eq!(crops[0]["suitability_score"], 100);
    assert_eq!(crops[0]["water_requirement"], "high");
}

#[tokio::test]
async fn test_rank_respects_top_n() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile = json!({ "ph_level": 6.5, "soil_type": "Loamy" });
    let response = client.rank(&profile, Some(2)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert!(crop_names(&json["suitable_crops"]).len() <= 2);
}

#[tokio::test]
async fn test_rank_empty_profile_has_no_suitable_crops() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.rank(&json!({}), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["suitable_crops"], json!([]));
}

#[tokio::test]
async fn test_rank_rejects_zero_top_n() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.rank(&json!({ "ph_level": 6.5 }), Some(0)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("top_n"));
}

#[tokio::test]
async fn test_rank_top_n_above_catalog_size_returns_all_qualifying() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile = json!({
        "ph_level": 6.5,
        "nitrogen": 50,
        "phosphorus": 30,
        "potassium": 150,
        "soil_type": "Loamy"
    });
    let response = client.rank(&profile, Some(20)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    // Every crop in the catalog grows in loamy soil at pH 6.5
    let names = crop_names(&json["suitable_crops"]);
    assert_eq!(names.len(), 10);
    assert_eq!(names[0], "Rice");
}

#[tokio::test]
async fn test_rank_rejects_non_numeric_ph() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.rank(&json!({ "ph_level": "acidic" }), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Recommend Tests
// =============================================================================

#[tokio::test]
async fn test_recommend_without_analysis_uses_reference_crops() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.recommend_crops(OTHER_OWNER_ID, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json: Value = response.json().await.unwrap();
    let data = &json["data"];
    assert_eq!(crop_names(data), vec!["Rice", "Wheat", "Maize"]);
    assert_eq!(data[0]["confidence_score"], 0.85);
    assert_eq!(data[1]["confidence_score"], 0.78);
    assert_eq!(data[2]["confidence_score"], 0.82);
    assert_eq!(data[1]["variety"], "HD 2967");
    assert!(data[0]["soil_analysis_id"].is_null());
    assert_eq!(data[0]["user_id"], OTHER_OWNER_ID);
}

#[tokio::test]
async fn test_recommend_uses_latest_analysis() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let analysis_id = client.analyze_ok(&optimal_sample(OWNER_ID)).await;

    let response = client.recommend_crops(OWNER_ID, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json: Value = response.json().await.unwrap();
    let data = &json["data"];
    let first = &data[0];
    assert_eq!(first["crop_name"], "Rice");
    assert_eq!(first["confidence_score"], 1.0);
    assert_eq!(first["variety"], "Basmati 370");
    assert_eq!(first["fertilizer_recommendation"], "NPK 120:60:40 kg/ha");
    assert_eq!(first["soil_analysis_id"], analysis_id);

    // Every match of the analysis becomes one recommendation
    let analysis: Value = client.get_analysis(analysis_id).await.json().await.unwrap();
    assert_eq!(
        crop_names(data),
        crop_names(&analysis["data"]["suitable_crops"])
    );
}

#[tokio::test]
async fn test_recommend_with_explicit_analysis_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let analysis_id = client.analyze_ok(&optimal_sample(OWNER_ID)).await;

    let response = client
        .recommend_crops_with(&json!({
            "user_id": OWNER_ID.to_string(),
            "soil_analysis_id": analysis_id
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json: Value = response.json().await.unwrap();
    for rec in json["data"].as_array().unwrap() {
        assert_eq!(rec["soil_analysis_id"], analysis_id);
        assert_eq!(rec["user_id"], OWNER_ID);
    }
}

#[tokio::test]
async fn test_recommend_unknown_analysis_returns_404() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.recommend_crops(OWNER_ID, Some(4242)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nothing is stored for a failed request
    let response = client.crop_recommendations(OWNER_ID).await;
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn test_recommend_without_user_id_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.recommend_crops_with(&json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Missing required field: user_id");

    let response = client
        .recommend_crops_with(&json!({ "user_id": "farmer" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Stored Recommendations Tests
// =============================================================================

#[tokio::test]
async fn test_stored_recommendations_are_listed_per_owner() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.recommend_crops(OWNER_ID, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.crop_recommendations(OWNER_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    let stored = json["data"].as_array().unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|r| r["id"].as_i64().unwrap() > 0));
    assert!(stored.iter().all(|r| r["created_at"].is_string()));

    let response = client.crop_recommendations(OTHER_OWNER_ID).await;
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"], json!([]));

    let stored = server
        .soil_store
        .list_crop_recommendations(OWNER_ID, 10, 0)
        .unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn test_stored_recommendations_newest_first() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    client.recommend_crops(OWNER_ID, None).await;
    client.analyze_ok(&optimal_sample(OWNER_ID)).await;
    let response = client.recommend_crops(OWNER_ID, None).await;
    let latest: Value = response.json().await.unwrap();
    let latest_ids: Vec<i64> = latest["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();

    let response = client.crop_recommendations(OWNER_ID).await;
    let json: Value = response.json().await.unwrap();
    let listed = json["data"].as_array().unwrap();
    assert_eq!(listed.len(), latest_ids.len() + 3);
    assert!(latest_ids.contains(&listed[0]["id"].as_i64().unwrap()));
    assert!(listed
        .iter()
        .rev()
        .take(3)
        .all(|r| r["soil_analysis_id"].is_null()));
}
