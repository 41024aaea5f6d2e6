//! HTTP routes over the NEO pipeline
//!
//! Every route reads the raw store, flattens it and computes its view from
//! scratch. Failures are answered with a JSON error body, never an error page.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use neo_core::{ClusterReport, Extremes, NeoError, TrendForecast};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::{AnalysisConfig, BackendConfig};
use crate::model::feed::{self, FeedClient, FeedWindow, FetchSummary, RawStore};
use crate::module::export::export_csv;
use crate::module::renderer::ScatterRenderer;
use crate::module::table::render_table;

/// Shared handles for all routes
pub struct AppState {
    pub store: Arc<dyn RawStore>,
    pub feed: FeedClient,
    pub renderer: ScatterRenderer,
    pub export_path: PathBuf,
    /// Window used when `/fetch-and-store` names no dates
    pub default_window: FeedWindow,
    pub clear_before_fetch: bool,
    pub analysis: AnalysisConfig,
}

impl AppState {
    pub fn from_config(config: &BackendConfig, store: Arc<dyn RawStore>) -> anyhow::Result<Self> {
        let default_window = FeedWindow::parse(&config.nasa.start_date, &config.nasa.end_date)
            .map_err(|e| anyhow::anyhow!("Invalid default fetch window: {}", e))?;

        Ok(Self {
            store,
            feed: FeedClient::new(&config.nasa)?,
            renderer: ScatterRenderer::new(config.image_dir()),
            export_path: config.export_path(),
            default_window,
            clear_before_fetch: config.clear_before_fetch,
            analysis: config.analysis.clone(),
        })
    }
}

/// Error answered by a route
#[derive(Debug)]
pub enum ApiError {
    Neo(NeoError),
    BadRequest(String),
}

impl From<NeoError> for ApiError {
    fn from(e: NeoError) -> Self {
        ApiError::Neo(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    kind: "bad_request".to_string(),
                    status_code: None,
                },
            ),
            ApiError::Neo(e) => {
                let status = match &e {
                    NeoError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
                    NeoError::InvalidHorizon { .. } => StatusCode::BAD_REQUEST,
                    NeoError::MalformedPayload(_)
                    | NeoError::EmptyResult { .. }
                    | NeoError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    NeoError::Store(_) | NeoError::Export(_) | NeoError::Render(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    ErrorBody {
                        error: e.to_string(),
                        kind: e.kind().to_string(),
                        status_code: e.status_code(),
                    },
                )
            }
        };

        if status.is_server_error() {
            error!("Request failed: {} ({})", body.error, body.kind);
        } else {
            warn!("Request rejected: {} ({})", body.error, body.kind);
        }

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClusterParams {
    pub k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictParams {
    pub horizon_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
struct FetchResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: FetchSummary,
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    status: &'static str,
    path: String,
    rows: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/fetch-and-store", get(fetch_and_store))
        .route("/transform", get(transform))
        .route("/export", get(export))
        .route("/analyze", get(analyze))
        .route("/visualize", get(visualize))
        .route("/cluster", get(cluster))
        .route("/predict", get(predict))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let payloads = state.store.read_all().await?;
    let records = neo_core::flatten(&payloads);

    Ok(Json(serde_json::json!({
        "status": "running",
        "service": "neo-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "payloads": payloads.len(),
        "records": records.len(),
    })))
}

async fn fetch_and_store(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> ApiResult<Json<FetchResponse>> {
    let Query(params) = params?;

    let window = match (params.start_date, params.end_date) {
        (None, None) => state.default_window,
        (start, end) => {
            let start = start.unwrap_or_else(|| state.default_window.start_date.to_string());
            let end = end.unwrap_or_else(|| start.clone());
            FeedWindow::parse(&start, &end).map_err(ApiError::BadRequest)?
        }
    };

    let summary = feed::fetch_and_store(
        &state.feed,
        state.store.as_ref(),
        window,
        state.clear_before_fetch,
    )
    .await?;

    Ok(Json(FetchResponse {
        status: "Data saved to the database",
        summary,
    }))
}

async fn transform(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let records = feed::load_records(state.store.as_ref()).await?;
    Ok(Html(render_table(&records)))
}

async fn export(State(state): State<Arc<AppState>>) -> ApiResult<Json<ExportResponse>> {
    let records = feed::load_records(state.store.as_ref()).await?;
    let rows = export_csv(&records, &state.export_path).await?;

    Ok(Json(ExportResponse {
        status: "Data exported to CSV",
        path: state.export_path.display().to_string(),
        rows,
    }))
}

async fn analyze(State(state): State<Arc<AppState>>) -> ApiResult<Json<Extremes>> {
    let records = feed::load_records(state.store.as_ref()).await?;
    Ok(Json(neo_core::extremes(&records)?))
}

async fn visualize(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let records = feed::load_records(state.store.as_ref()).await?;
    let png = state.renderer.render(&records).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn cluster(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ClusterParams>, QueryRejection>,
) -> ApiResult<Json<ClusterReport>> {
    let Query(params) = params?;
    let k = params.k.unwrap_or(state.analysis.cluster_count);

    let records = feed::load_records(state.store.as_ref()).await?;
    Ok(Json(neo_core::cluster_with_seed(
        &records,
        k,
        state.analysis.cluster_seed,
    )?))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PredictParams>, QueryRejection>,
) -> ApiResult<Json<TrendForecast>> {
    let Query(params) = params?;
    let horizon = params
        .horizon_seconds
        .unwrap_or(state.analysis.forecast_horizon_seconds);
    if horizon < 0 {
        return Err(ApiError::BadRequest(format!(
            "horizon_seconds must not be negative, got {}",
            horizon
        )));
    }

    let records = feed::load_records(state.store.as_ref()).await?;
    Ok(Json(neo_core::forecast(&records, horizon)?))
}
