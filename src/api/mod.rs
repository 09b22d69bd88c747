//! HTTP binding for the observation store and time aggregator
//!
//! Routes marshal requests into store and aggregator calls and serialize the
//! results. Store errors map to 404 / 400, source failures to 502.

pub mod handlers;

use crate::aggregator::TimeAggregator;
use crate::error::{FetchError, StoreError};
use crate::store::ObservationStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::error;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Shared state handed to every handler
pub struct AppState {
    pub store: Arc<ObservationStore>,
    pub aggregator: TimeAggregator,
}

impl AppState {
    pub fn new(store: Arc<ObservationStore>, aggregator: TimeAggregator) -> Self {
        Self { store, aggregator }
    }

    /// State whose aggregator reads the same store directly
    pub fn in_process(store: Arc<ObservationStore>) -> Self {
        let aggregator = TimeAggregator::new(store.clone());
        Self::new(store, aggregator)
    }
}

/// Errors surfaced to HTTP callers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Observation not found".to_string())
            }
            ApiError::Store(StoreError::InvalidState(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::Fetch(e) => {
                error!("Failed to fetch observations for aggregation: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/observations", get(handlers::list_summary))
        .route("/observations/full", get(handlers::list_full))
        .route("/observations/generate", post(handlers::generate))
        .route(
            "/observations/generate_problem_reports",
            post(handlers::assign_problem_reports),
        )
        .route(
            "/observations/assign_investigations",
            post(handlers::assign_investigations),
        )
        .route("/observations/:id", get(handlers::get_observation))
        .route(
            "/observations/:id/update_problem_report",
            put(handlers::update_problem_report),
        )
        .route(
            "/observations/:id/remove_problem_report",
            delete(handlers::remove_problem_report),
        )
        .route(
            "/investigation_reports",
            get(handlers::list_investigation_reports),
        )
        .route("/total_downtime_time", get(handlers::total_downtime))
        .route("/total_downtime_time/", get(handlers::total_downtime))
        .route("/total_observation_time", get(handlers::total_observed_time))
        .route("/total_observation_time/", get(handlers::total_observed_time))
        .route("/total_reported_time", get(handlers::total_reported_time))
        .route("/total_reported_time/", get(handlers::total_reported_time))
        .with_state(state)
}
