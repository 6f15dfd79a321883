//! End-to-end tests for the weather API router.
//!
//! The router runs in-process; the upstream provider is a wiremock server.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_api::config::DashboardConfig;
use weather_api::routes::build_router;
use weather_api::state::AppState;

fn london() -> Value {
    json!({
        "id": 2643743,
        "name": "London",
        "sys": {"country": "GB", "sunrise": 1700000000, "sunset": 1700030000},
        "main": {"temp": 11.2, "temp_min": 9.8, "temp_max": 12.5, "pressure": 1012, "humidity": 81},
        "weather": [{"main": "Clouds", "description": "broken clouds"}],
        "wind": {"speed": 4.6, "deg": 240},
        "visibility": 10000
    })
}

fn test_config(server: &MockServer, cities_file: &Path, api_key: Option<&str>) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.cities_file = cities_file.to_path_buf();
    config.upstream.base_url = server.uri();
    config.upstream.api_key = api_key.map(str::to_string);
    config
}

async fn state_with(config: DashboardConfig) -> Arc<AppState> {
    Arc::new(AppState::new(config).await.unwrap())
}

async fn app_with(config: DashboardConfig) -> Router {
    build_router(state_with(config).await)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn mount_name_lookup(server: &MockServer, name: &str, payload: Value) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_same_city_twice() {
    let server = MockServer::start().await;
    mount_name_lookup(&server, "London", london()).await;

    let dir = TempDir::new().unwrap();
    let cities_file = dir.path().join("cities.json");
    let app = app_with(test_config(&server, &cities_file, Some("test-key"))).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cityId": "2643743", "already": false}));

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cityId": "2643743", "already": true}));

    let persisted: Value =
        serde_json::from_str(&std::fs::read_to_string(&cities_file).unwrap()).unwrap();
    assert_eq!(persisted["List"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/cities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cityIds": ["2643743"]}));
}

#[tokio::test]
async fn test_add_city_without_name() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing city name"}));

    let (status, body) = send(&app, Method::POST, "/api/cities", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing city name"}));

    let (status, _) = send(&app, Method::POST, "/api/cities", Some(json!({"name": 42}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_city_without_key() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), None)).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Missing OPENWEATHER_KEY on server"}));

    // Listing does not need the provider
    let (status, body) = send(&app, Method::GET, "/api/cities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cityIds": []}));
}

#[tokio::test]
async fn test_add_unknown_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "Atlantis"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "City not found"}));
}

#[tokio::test]
async fn test_add_city_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to add city"}));
}

#[tokio::test]
async fn test_add_city_rejected_key_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"cod": 401, "message": "Invalid API key"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("bad-key"))).await;

    let (status, body) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "City not found"}));
}

#[tokio::test]
async fn test_delete_city() {
    let server = MockServer::start().await;
    mount_name_lookup(&server, "London", london()).await;

    let dir = TempDir::new().unwrap();
    let cities_file = dir.path().join("cities.json");
    let app = app_with(test_config(&server, &cities_file, Some("test-key"))).await;

    send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;

    let (status, body) = send(&app, Method::DELETE, "/api/cities/2643743", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true, "cityId": "2643743"}));

    let (status, body) = send(&app, Method::DELETE, "/api/cities/2643743", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "City not found"}));

    let persisted: Value =
        serde_json::from_str(&std::fs::read_to_string(&cities_file).unwrap()).unwrap();
    assert_eq!(persisted, json!({"List": []}));
}

#[tokio::test]
async fn test_weather_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("id", "2643743"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, first) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fromCache"], false);
    assert_eq!(first["data"], london());

    let (status, second) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fromCache"], true);
    assert_eq!(second["data"], first["data"]);
}

#[tokio::test]
async fn test_weather_refetched_after_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("id", "2643743"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir.path().join("cities.json"), Some("test-key"));
    config.cache.ttl_secs = 1;
    let app = app_with(config).await;

    let (_, first) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(first["fromCache"], false);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (_, second) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(second["fromCache"], false);
}

#[tokio::test]
async fn test_weather_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, body) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch weather"}));
}

#[tokio::test]
async fn test_weather_provider_error_json_passed_through() {
    let server = MockServer::start().await;
    let not_found = json!({"cod": "404", "message": "city not found"});
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("id", "999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), Some("test-key"))).await;

    let (status, body) = send(&app, Method::GET, "/api/weather/999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"fromCache": false, "data": not_found}));

    let (status, body) = send(&app, Method::GET, "/api/weather/999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"fromCache": true, "data": not_found}));
}

#[tokio::test]
async fn test_weather_without_key() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state = state_with(test_config(&server, &dir.path().join("cities.json"), None)).await;
    let app = build_router(state.clone());

    let (status, body) = send(&app, Method::GET, "/api/weather/2643743", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Missing OPENWEATHER_KEY on server"}));

    let (status, _) = send(&app, Method::POST, "/api/cities", Some(json!({"name": "London"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Nothing was sent upstream, so nothing is counted as an upstream call
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(state.metrics.upstream_requests.load(Ordering::Relaxed), 0);
    assert_eq!(state.metrics.upstream_errors.load(Ordering::Relaxed), 0);
    assert_eq!(state.weather_cache.len().await, 0);
}

#[tokio::test]
async fn test_cities_loaded_from_legacy_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let cities_file = dir.path().join("cities.json");
    std::fs::write(
        &cities_file,
        r#"[{"CityCode": "1248991", "CityName": "Colombo"}, {"CityName": "No code"}]"#,
    )
    .unwrap();

    let app = app_with(test_config(&server, &cities_file, Some("test-key"))).await;

    let (status, body) = send(&app, Method::GET, "/api/cities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cityIds": ["1248991"]}));
}

#[tokio::test]
async fn test_custom_prefix() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir.path().join("cities.json"), Some("test-key"));
    config.api_prefix = "/v1/".to_string();
    let app = app_with(config).await;

    let (status, _) = send(&app, Method::GET, "/v1/cities", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/cities", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with(test_config(&server, &dir.path().join("cities.json"), None)).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cities"], 0);
    assert_eq!(body["upstreamConfigured"], false);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("weather_cache_hits_total 0"));
    assert!(text.contains("# TYPE city_store_persist_failures_total counter"));
}
