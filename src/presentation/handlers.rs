// HTTP request handlers
use crate::application::combination::Direction;
use crate::application::meter_session::{FetchAck, FetchStatus};
use crate::domain::error::EngineError;
use crate::domain::selection::{DateRange, Selection};
use crate::infrastructure::export::{self, ExportFormat};
use crate::infrastructure::http_response::{accepts_brotli, file_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Error body `{ "error": "<message>" }` with a status derived from the failure
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
            EngineError::MissingChannel { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::UnknownMetric(_) | EngineError::UnknownView(_) => StatusCode::NOT_FOUND,
            EngineError::NotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::InvalidCatalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: error.to_string() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", error);
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: error.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
pub struct ViewQuery {
    pub view: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewsQuery {
    pub active: Option<String>,
    pub step: Option<Direction>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub view: Option<String>,
    pub format: Option<String>,
}

/// Omitted dates default to today.
#[derive(Deserialize)]
pub struct SelectionRequest {
    pub meter: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SelectionRequest {
    fn into_selection(self, today: NaiveDate) -> ApiResult<Selection> {
        let end_date = self.end_date.unwrap_or(today);
        let start_date = self.start_date.unwrap_or(end_date);
        if self.meter.trim().is_empty() {
            return Err(ApiError::bad_request("meter must not be empty"));
        }
        if start_date > end_date {
            return Err(ApiError::bad_request(format!(
                "start_date {} is after end_date {}",
                start_date, end_date
            )));
        }
        Ok(Selection::new(self.meter, DateRange { start_date, end_date }))
    }
}

#[derive(Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub wait: bool,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    #[serde(flatten)]
    pub ack: FetchAck,
    pub fetch: FetchStatus,
}

const REFRESH_WAIT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub selection: Selection,
    pub loaded: bool,
    pub fetched_at: Option<String>,
    pub latest_timestamp: Option<String>,
    pub fetch: FetchStatus,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let session = state.chart_service.session();
    let snapshot = session.snapshot();
    Json(StatusResponse {
        selection: session.selection().await,
        loaded: snapshot.is_some(),
        fetched_at: snapshot.as_ref().map(|s| s.fetched_at.to_rfc3339()),
        latest_timestamp: snapshot
            .as_ref()
            .and_then(|s| s.series.latest_timestamp().map(str::to_string)),
        fetch: session.status(),
    })
}

pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<Json<FetchAck>> {
    let selection = request.into_selection(chrono::Local::now().date_naive())?;
    Ok(Json(state.chart_service.session().select(selection).await))
}

/// With `?wait=true`, answers once the accepted fetch has finished.
pub async fn refresh(
    Query(query): Query<RefreshQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<RefreshResponse> {
    let session = state.chart_service.session();
    let mut updates = session.status_updates();
    let ack = session.request_fetch().await;

    if query.wait && matches!(ack, FetchAck::Accepted { .. }) {
        let finished = updates.wait_for(|status| !status.in_flight);
        if tokio::time::timeout(REFRESH_WAIT, finished).await.is_err() {
            tracing::warn!("Refresh still running after {:?}", REFRESH_WAIT);
        }
    }

    Json(RefreshResponse { ack, fetch: session.status() })
}

pub async fn series(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let snapshot = state.chart_service.loaded()?;
    Ok(Json(json!({
        "requestId": snapshot.request_id,
        "selection": snapshot.selection,
        "fetchedAt": snapshot.fetched_at.to_rfc3339(),
        "series": snapshot.series,
    })))
}

pub async fn device(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let snapshot = state.chart_service.loaded()?;
    Ok(Json(snapshot.series.device_info.clone()))
}

pub async fn catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.chart_service.catalog())
}

pub async fn views(
    Path(metric): Path<String>,
    Query(query): Query<ViewsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let list = state
        .chart_service
        .views(&metric, query.active.as_deref(), query.step)?;
    Ok(Json(list))
}

pub async fn chart(
    Path(metric): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.chart_service.chart(&metric, query.view.as_deref())?;
    tracing::debug!(
        metric = %metric,
        view = %dataset.view,
        data = dataset.data_series().count(),
        overlays = dataset.series.len() - dataset.data_series().count(),
        "assembled chart"
    );
    Ok(Json(dataset))
}

pub async fn table(
    Path(metric): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let export = state.chart_service.table(&metric, query.view.as_deref())?;
    Ok(Json(json!({
        "selection": export.selection,
        "view": export.view,
        "columns": export.rows.columns,
        "rows": export.rows.records(),
    })))
}

pub async fn export_table(
    Path(metric): Path<String>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let format = match query.format.as_deref() {
        None => ExportFormat::default(),
        Some(name) => ExportFormat::parse(name)
            .ok_or_else(|| ApiError::bad_request(format!("Unsupported export format: {}", name)))?,
    };

    let table = state.chart_service.table(&metric, query.view.as_deref())?;
    let bytes = export::render(&table.rows, format)?;
    let filename = export::file_name(&table.selection.meter, &table.view, format);
    if table.rows.is_empty() {
        tracing::warn!("Exporting {} with no rows", filename);
    } else {
        tracing::info!("Exporting {} rows as {}", table.rows.len(), filename);
    }

    Ok(file_response(bytes, format.content_type(), &filename, accepts_brotli(&headers)).await?)
}
