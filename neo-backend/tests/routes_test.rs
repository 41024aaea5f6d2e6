use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::get,
    Json, Router,
};
use neo_backend::config::{AnalysisConfig, NasaConfig};
use neo_backend::model::feed::{FeedClient, FeedWindow, MemoryRawStore, RawStore};
use neo_backend::module::renderer::ScatterRenderer;
use neo_backend::service::{router, AppState, ErrorBody};
use neo_core::RawPayload;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn asteroid(id: &str, name: &str, km: &str, kph: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "close_approach_data": [{
            "miss_distance": { "kilometers": km },
            "relative_velocity": { "kilometers_per_hour": kph }
        }]
    })
}

fn sample_payload() -> RawPayload {
    RawPayload::new(json!({
        "near_earth_objects": {
            "2015-09-08": [
                asteroid("1", "(2015 RC)", "4000000", "50000"),
                asteroid("2", "(2015 RD)", "900000", "30000"),
                { "id": "3", "name": "(no data)", "close_approach_data": [] }
            ],
            "2015-09-07": [
                asteroid("4", "(2015 RE)", "2500000", "90000"),
                asteroid("5", "(2015 RF)", "7000000", "12000")
            ]
        }
    }))
}

struct TestApp {
    app: Router,
    store: Arc<MemoryRawStore>,
    dir: TempDir,
}

fn test_app(payloads: Vec<RawPayload>, feed_url: &str) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryRawStore::with_payloads(payloads));

    let state = AppState {
        store: store.clone(),
        feed: FeedClient::new(&NasaConfig {
            base_url: feed_url.to_string(),
            timeout_seconds: 5,
            ..NasaConfig::default()
        })
        .unwrap(),
        renderer: ScatterRenderer::new(dir.path().join("images")),
        export_path: dir.path().join("transformed_data.csv"),
        default_window: FeedWindow::parse("2015-09-07", "2015-09-08").unwrap(),
        clear_before_fetch: true,
        analysis: AnalysisConfig::default(),
    };

    TestApp {
        app: router(Arc::new(state)),
        store,
        dir,
    }
}

async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/feed", addr)
}

async fn get_raw(app: &Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), content_type)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = get_raw(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

const NO_UPSTREAM: &str = "http://127.0.0.1:9/feed";

#[tokio::test]
async fn analyze_reports_closest_and_fastest() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/analyze").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closest_neo"]["id"], "2");
    assert_eq!(body["closest_neo"]["miss_distance_km"], 900000.0);
    assert_eq!(body["closest_neo"]["close_approach_date"], "2015-09-08");
    assert_eq!(body["fastest_neo"]["id"], "4");
    assert_eq!(body["fastest_neo"]["velocity_kph"], 90000.0);
}

#[tokio::test]
async fn analyze_without_values_is_structured_error() {
    let empty_only = RawPayload::new(json!({
        "near_earth_objects": { "2015-09-08": [{ "id": "3", "name": "x", "close_approach_data": [] }] }
    }));
    let t = test_app(vec![empty_only], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/analyze").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let err: ErrorBody = serde_json::from_value(body).unwrap();
    assert_eq!(err.kind, "empty_result");
    assert!(err.error.contains("miss_distance_km"));
}

#[tokio::test]
async fn malformed_payloads_do_not_break_routes() {
    let t = test_app(
        vec![
            RawPayload::new(json!({ "error": "rate limited" })),
            sample_payload(),
            RawPayload::new(json!({ "near_earth_objects": null })),
        ],
        NO_UPSTREAM,
    );

    let (status, body) = get_json(&t.app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payloads"], 3);
    assert_eq!(body["records"], 5);

    let (status, _) = get_json(&t.app, "/analyze").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn transform_renders_every_record() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body, content_type) = get_raw(&t.app, "/transform").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));

    let html = String::from_utf8(body).unwrap();
    assert_eq!(html.matches("<tr>").count(), 5);
    assert!(html.contains("(no data)"));
    assert!(html.contains("<td>NaN</td>"));
}

#[tokio::test]
async fn export_writes_csv() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/export").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Data exported to CSV");
    assert_eq!(body["rows"], 5);

    let path = t.dir.path().join("transformed_data.csv");
    assert_eq!(body["path"], path.display().to_string());
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content.lines().count(), 6);
    assert!(content.contains("3,(no data),2015-09-08,,"));
}

#[tokio::test]
async fn cluster_default_and_errors() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/cluster").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["centers"].as_array().unwrap().len(), 3);
    let total: u64 = body["counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 4);
    assert_eq!(body["assignments"].as_array().unwrap().len(), 4);

    let (status, body) = get_json(&t.app, "/cluster?k=9").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "insufficient_data");

    let (status, body) = get_json(&t.app, "/cluster?k=many").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn predict_projects_a_week_ahead() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/predict").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["samples"], 4);
    // 2015-09-08T00:00:00Z + 7 days
    assert_eq!(body["future_timestamp"], 1_441_670_400i64 + 604_800);
    assert!(body["predicted_distance_km"].is_number());

    let (status, body) = get_json(&t.app, "/predict?horizon_seconds=86400").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["future_timestamp"], 1_441_670_400i64 + 86_400);

    let (status, body) = get_json(&t.app, "/predict?horizon_seconds=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn predict_rejects_out_of_range_horizon() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/predict?horizon_seconds=9223372036854775807").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_value(body).unwrap();
    assert_eq!(err.kind, "invalid_horizon");
    assert!(err.error.contains("9223372036854775807"));

    // Service keeps answering afterwards
    let (status, _) = get_json(&t.app, "/predict").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn predict_needs_two_points() {
    let single = RawPayload::new(json!({
        "near_earth_objects": { "2015-09-08": [asteroid("1", "A", "1000", "5000")] }
    }));
    let t = test_app(vec![single], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/predict").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "insufficient_data");
}

#[tokio::test]
async fn visualize_returns_png() {
    let t = test_app(vec![sample_payload()], NO_UPSTREAM);

    let (status, body, content_type) = get_raw(&t.app, "/visualize").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[..4], b"\x89PNG");
}

#[tokio::test]
async fn fetch_and_store_replaces_store() {
    let upstream = Router::new().route(
        "/feed",
        get(|| async { Json(sample_payload().as_value().clone()) }),
    );
    let url = spawn_upstream(upstream).await;
    let t = test_app(
        vec![RawPayload::new(json!({ "near_earth_objects": { "2000-01-01": [asteroid("old", "Old", "1", "1")] } }))],
        &url,
    );

    let (status, body) = get_json(&t.app, "/fetch-and-store?start_date=2015-09-07&end_date=2015-09-08").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Data saved to the database");
    assert_eq!(body["records"], 5);
    assert_eq!(body["cleared"], true);
    assert_eq!(body["window"]["start_date"], "2015-09-07");

    let stored = t.store.read_all().await.unwrap();
    assert_eq!(stored, vec![sample_payload()]);
}

#[tokio::test]
async fn fetch_and_store_reports_upstream_failure() {
    let upstream = Router::new().route(
        "/feed",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let url = spawn_upstream(upstream).await;
    let t = test_app(vec![sample_payload()], &url);

    let (status, body) = get_json(&t.app, "/fetch-and-store").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "upstream_fetch");
    assert_eq!(body["status_code"], 503);

    // Previous data survives a failed fetch
    assert_eq!(t.store.read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_and_store_rejects_bad_window() {
    let t = test_app(vec![], NO_UPSTREAM);

    let (status, body) = get_json(&t.app, "/fetch-and-store?start_date=2015-09-08&end_date=2015-09-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("before"));
}

#[tokio::test]
async fn health_check() {
    let t = test_app(vec![], NO_UPSTREAM);
    let (status, body, _) = get_raw(&t.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}
