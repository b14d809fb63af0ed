use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower::ServiceExt;

use crate::config::Config;

fn rect(west: f64, south: f64, east: f64, north: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[west, south], [east, south], [east, north], [west, north], [west, south]]]
    })
}

fn write_fixtures(data_dir: &PathBuf) {
    let facilities = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": rect(-84.4300, 33.6400, -84.4297, 33.6403),
                "properties": {
                    "id": "terminal",
                    "name": "Terminal A",
                    "amenity": "Terminal",
                    "distance_requirements": { "contains_people": true }
                }
            },
            {
                "type": "Feature",
                "geometry": rect(-84.4296, 33.6400, -84.4294, 33.6402),
                "properties": { "id": "pad", "name": "Apron pad", "amenity": "Free Space" }
            },
            {
                "type": "Feature",
                "geometry": rect(-84.4200, 33.6500, -84.4197, 33.6503),
                "properties": { "id": "field", "name": "North field", "amenity": "Free Space" }
            }
        ]
    });
    let geojson_dir = data_dir.join("geojson");
    std::fs::create_dir_all(&geojson_dir).unwrap();
    std::fs::write(geojson_dir.join("facilities.geojson"), facilities.to_string()).unwrap();
    std::fs::write(
        data_dir.join("distances_requirements.csv"),
        "regulation_info,storage_gal_min,storage_gal_max,safety_distance_ft\n\
         Buildings containing people,0,,200\n\
         Flammable liquids storage,0,,100\n",
    )
    .unwrap();
}

fn setup_app() -> Router {
    let mut config = Config::from_env();
    config.data_dir = std::env::temp_dir().join(format!("siting-test-{}", uuid::Uuid::new_v4()));
    config.facilities_file = "geojson/facilities.geojson".to_string();
    config.requirements_file = "distances_requirements.csv".to_string();
    config.buffer_zones_file = "geojson/buffer_zones.geojson".to_string();
    config.rules = siting_core::SitingRules::default();
    write_fixtures(&config.data_dir);
    crate::app(config)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = setup_app();
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lists_facilities_and_requirements() {
    let app = setup_app();

    let response = get(&app, "/v1/facilities").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["features"].as_array().unwrap().len(), 3);

    let response = get(&app, "/v1/requirements").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["rules"].as_array().unwrap().len(), 2);
    assert_eq!(body["max_distances"]["people"], 200.0);
    assert_eq!(body["max_distances"]["flammable_liquids"], 100.0);
}

#[tokio::test]
async fn generate_then_fetch_buffer_zones() {
    let app = setup_app();

    let response = post_json(&app, "/v1/buffer-zones/generate", json!({ "name": "test_buffers" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["name"], "test_buffers");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["facility_id"], "terminal");
    assert_eq!(features[0]["properties"]["buffer_distance_ft"], 200.0);

    let response = get(&app, "/v1/buffer-zones").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["name"], "test_buffers");
    assert_eq!(body["features"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn compliance_requires_generated_buffers() {
    let app = setup_app();
    let response = get(&app, "/v1/storage-areas/compliance").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn storage_area_compliance_results() {
    let app = setup_app();
    let response = post_json(&app, "/v1/buffer-zones/generate", json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, "/v1/storage-areas/compliance?storage_volume_gal=10000").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["compliant"], 1);
    assert_eq!(body["summary"]["non_compliant"], 1);

    let results = body["results"].as_array().unwrap();
    let by_id = |id: &str| {
        results
            .iter()
            .find(|r| r["area_id"] == id)
            .cloned()
            .unwrap_or_else(|| panic!("missing result for {id}"))
    };
    let pad = by_id("pad");
    assert_eq!(pad["compliance_status"], "non-compliant");
    assert_eq!(pad["available_area_sqft"], 0.0);
    assert_eq!(pad["area_reduction_percent"], 100.0);
    assert_eq!(pad["overlapping_buffers"][0]["facility_name"], "Terminal A");

    let field = by_id("field");
    assert_eq!(field["compliance_status"], "compliant");
    assert_eq!(field["area_reduction_percent"], 0.0);
    assert!(field["overlapping_buffers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_volume_is_bad_request() {
    let app = setup_app();
    post_json(&app, "/v1/buffer-zones/generate", json!({})).await;

    let response = get(&app, "/v1/storage-areas/compliance?storage_volume_gal=-5").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "invalid_volume");

    let response = get(&app, "/v1/required-area?storage_volume_gal=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn required_area_for_volume() {
    let app = setup_app();
    let response = get(&app, "/v1/required-area?storage_volume_gal=50000").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let tanks = body["tanks"].as_f64().unwrap();
    let area = body["required_area_sqft"].as_f64().unwrap();
    assert!(tanks > 2.0 && tanks < 4.0);
    assert!((area - tanks * 10.1667 * 56.5).abs() < 1e-6);
}

#[tokio::test]
async fn distance_check_without_hazards_is_unprocessable() {
    let app = setup_app();
    let response = post_json(
        &app,
        "/v1/distance-check",
        json!({
            "centroid": [33.65015, -84.41985],
            "storage_volume_gal": 5000.0,
            "hazard_points_by_category": { "contains_people": [] }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn distance_check_verdicts() {
    let app = setup_app();

    let response = post_json(
        &app,
        "/v1/distance-check",
        json!({
            "area_id": "field",
            "centroid": [33.65015, -84.41985],
            "storage_volume_gal": 5000.0,
            "hazard_points_by_category": { "contains_people": [[33.64015, -84.42985]] }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["area_id"], "field");
    assert_eq!(body["compliant"], true);
    assert_eq!(body["required_distance_ft"], 200.0);
    assert_eq!(body["nearest_category"], "contains_people");

    // Polygon input: the pad's vertex average sits right next to the terminal.
    let response = post_json(
        &app,
        "/v1/distance-check",
        json!({
            "polygon": [[[-84.4296, 33.6400], [-84.4294, 33.6400], [-84.4294, 33.6402], [-84.4296, 33.6402], [-84.4296, 33.6400]]],
            "storage_volume_gal": 5000.0,
            "hazard_points_by_category": { "people": [[33.64015, -84.42985]] }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["compliant"], false);
    assert!(body["actual_distance_ft"].as_f64().unwrap() < 200.0);
}

#[tokio::test]
async fn distance_check_needs_an_area() {
    let app = setup_app();
    let response = post_json(
        &app,
        "/v1/distance-check",
        json!({
            "storage_volume_gal": 5000.0,
            "hazard_points_by_category": { "people": [[33.64015, -84.42985]] }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zoning_violations() {
    let app = setup_app();

    let response = get(&app, "/v1/violations").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let violations = body.as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["source_id"], "pad");
    assert_eq!(violations[0]["target_id"], "terminal");
    assert_eq!(violations[0]["hazard_category"], "contains_people");

    let response = get(&app, "/v1/violations?amenity=Deicing").await;
    let body = read_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = setup_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = get(&app, "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
