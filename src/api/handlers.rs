//! HTTP endpoint handlers

use super::{ApiError, AppState};
use crate::aggregator::Metric;
use crate::observations::{
    iso8601, InvestigationReport, Observation, ObservationSummary, Timestamp,
};
use crate::store::InvestigationAssignment;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Body of a generation request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub start_time: Timestamp,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub end_time: Timestamp,
    pub base_name: String,
}

/// Query of a problem report update
#[derive(Debug, Deserialize)]
pub struct ProblemReportQuery {
    pub problem_report_ticket: String,
}

/// Closed query interval for time metrics
#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub start_time: Timestamp,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub end_time: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Replace the active batch and return it
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Json<Vec<Observation>> {
    Json(
        state
            .store
            .generate(request.start_time, request.end_time, &request.base_name),
    )
}

pub async fn list_summary(State(state): State<Arc<AppState>>) -> Json<Vec<ObservationSummary>> {
    Json(state.store.list_summary())
}

pub async fn list_full(State(state): State<Arc<AppState>>) -> Json<Vec<Observation>> {
    Json(state.store.list_full())
}

pub async fn get_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Observation>, ApiError> {
    Ok(Json(state.store.lookup(&id)?))
}

pub async fn update_problem_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProblemReportQuery>,
) -> Result<Json<Observation>, ApiError> {
    Ok(Json(
        state
            .store
            .update_problem_report(&id, &query.problem_report_ticket)?,
    ))
}

pub async fn remove_problem_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Observation>, ApiError> {
    Ok(Json(state.store.remove_problem_report(&id)?))
}

pub async fn assign_problem_reports(State(state): State<Arc<AppState>>) -> Json<Vec<Observation>> {
    Json(state.store.assign_problem_reports())
}

pub async fn assign_investigations(
    State(state): State<Arc<AppState>>,
) -> Json<InvestigationAssignment> {
    Json(state.store.assign_investigation_reports())
}

pub async fn list_investigation_reports(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<InvestigationReport>> {
    Json(state.store.investigation_reports())
}

pub async fn total_downtime(
    State(state): State<Arc<AppState>>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    metric_total(&state, Metric::Downtime, range).await
}

pub async fn total_observed_time(
    State(state): State<Arc<AppState>>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    metric_total(&state, Metric::ObservedTime, range).await
}

pub async fn total_reported_time(
    State(state): State<Arc<AppState>>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    metric_total(&state, Metric::ReportedTime, range).await
}

/// `{"<metric>_seconds": total}` for one metric
async fn metric_total(
    state: &AppState,
    metric: Metric,
    range: TimeRangeQuery,
) -> Result<Json<Value>, ApiError> {
    let total = state
        .aggregator
        .total(metric, range.start_time, range.end_time)
        .await?;

    let mut body = Map::new();
    body.insert(metric.response_key().to_string(), Value::from(total));
    Ok(Json(Value::Object(body)))
}
