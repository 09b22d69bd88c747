//! Interval-filtered duration sums over the observation collection
//!
//! Each metric call fetches the full collection from its [`ObservationSource`]
//! again, so results reflect whatever annotations the store holds at fetch time.

use crate::aggregator::source::ObservationSource;
use crate::error::FetchError;
use crate::observations::{Observation, ObservationStatus, Timestamp};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Time metric computed by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Failed observation time
    Downtime,
    /// Successful observation time
    ObservedTime,
    /// Failed observation time that carries a problem report
    ReportedTime,
}

impl Metric {
    /// Whether `observation` contributes to this metric, ignoring time bounds
    pub fn matches(&self, observation: &Observation) -> bool {
        match self {
            Metric::Downtime => observation.is_failed(),
            Metric::ObservedTime => observation.status == ObservationStatus::Success,
            Metric::ReportedTime => observation.is_failed() && observation.has_problem_report(),
        }
    }

    /// Field name used when the metric is returned to callers
    pub fn response_key(&self) -> &'static str {
        match self {
            Metric::Downtime => "total_downtime_time_seconds",
            Metric::ObservedTime => "total_observation_time_seconds",
            Metric::ReportedTime => "total_reported_time_seconds",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Downtime => "downtime",
            Metric::ObservedTime => "observed time",
            Metric::ReportedTime => "reported time",
        };
        write!(f, "{}", name)
    }
}

/// Sum the durations of matching observations, in seconds
///
/// An observation counts when it matches `metric` and its `start_time` lies in
/// the closed interval `[start, end]`. Its whole duration is added even when
/// `end_time` falls past `end`.
pub fn sum_durations(
    observations: &[Observation],
    metric: Metric,
    start: Timestamp,
    end: Timestamp,
) -> f64 {
    observations
        .iter()
        .filter(|o| metric.matches(o) && start <= o.start_time && o.start_time <= end)
        .fold(0.0, |total, o| total + o.duration_seconds())
}

/// Computes time metrics from a read-only observation source
#[derive(Clone)]
pub struct TimeAggregator {
    source: Arc<dyn ObservationSource>,
}

impl TimeAggregator {
    pub fn new(source: Arc<dyn ObservationSource>) -> Self {
        Self { source }
    }

    /// Total seconds for `metric` over observations starting in `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the source cannot supply the collection.
    pub async fn total(
        &self,
        metric: Metric,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, FetchError> {
        let observations = self.source.fetch_full().await?;
        let total = sum_durations(&observations, metric, start, end);
        debug!(
            "Total {} between {} and {} over {} observations: {}s",
            metric,
            start,
            end,
            observations.len(),
            total
        );
        Ok(total)
    }

    pub async fn total_downtime(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, FetchError> {
        self.total(Metric::Downtime, start, end).await
    }

    pub async fn total_observed_time(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, FetchError> {
        self.total(Metric::ObservedTime, start, end).await
    }

    pub async fn total_reported_time(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, FetchError> {
        self.total(Metric::ReportedTime, start, end).await
    }
}
