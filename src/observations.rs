//! Core observation types for the telescope observation tracker
//!
//! This module defines the records owned by the observation store: observations
//! with their success/failure outcome and optional annotations, the public summary
//! view of an observation, and the investigation reports annotations point at.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Outcome of a single observation window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ObservationStatus {
    /// The instrument observed successfully
    Success,
    /// The observation failed and counts as downtime
    Failed,
}

/// One monitored activity window, full view including annotations
///
/// `problem_report` is only ever present on failed observations. The
/// `investigation_report` field references an [`InvestigationReport`] id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    /// Globally unique identifier, assigned at creation
    #[serde(default)]
    pub id: String,
    /// Start of the observation window
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub start_time: Timestamp,
    /// End of the observation window, always after `start_time`
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub end_time: Timestamp,
    /// `{base_name}_{sequence}` with the sequence starting at 1
    #[serde(default)]
    pub name: String,
    /// Outcome, fixed at creation
    pub status: ObservationStatus,
    /// Linked incident ticket
    #[serde(default)]
    pub problem_report: Option<String>,
    /// Linked investigation report id
    #[serde(default)]
    pub investigation_report: Option<String>,
}

/// Public view of an observation with the annotation fields omitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationSummary {
    pub id: String,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub start_time: Timestamp,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub end_time: Timestamp,
    pub name: String,
    pub status: ObservationStatus,
}

/// Narrative record of an investigation, regenerated as a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestigationReport {
    pub id: String,
    /// Descriptive only; never used for filtering
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub start_time: Timestamp,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub end_time: Timestamp,
    pub investigation: String,
}

impl Observation {
    /// Length of the observation window in seconds
    pub fn duration_seconds(&self) -> f64 {
        let duration = self.end_time - self.start_time;
        match duration.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            None => duration.num_milliseconds() as f64 / 1_000.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ObservationStatus::Failed
    }

    /// An empty ticket counts as no report
    pub fn has_problem_report(&self) -> bool {
        self.problem_report
            .as_deref()
            .is_some_and(|ticket| !ticket.is_empty())
    }

    /// Project onto the public summary view
    pub fn summary(&self) -> ObservationSummary {
        ObservationSummary {
            id: self.id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            name: self.name.clone(),
            status: self.status,
        }
    }
}

impl From<&Observation> for ObservationSummary {
    fn from(observation: &Observation) -> Self {
        observation.summary()
    }
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339 with an offset, a naive date-time (`T` or space separated,
/// optional fractional seconds) or a bare date. Naive values are read as UTC.
/// A positive offset whose `+` was decoded to a space in a query string
/// (`2024-03-01T22:00:00 02:00`) is read as `+02:00`.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, chrono::ParseError> {
    let trimmed = input.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(datetime) => Ok(datetime.with_timezone(&Utc)),
        Err(rfc_error) => {
            if let Some(datetime) = restore_offset_sign(trimmed)
                .and_then(|restored| DateTime::parse_from_rfc3339(&restored).ok())
            {
                return Ok(datetime.with_timezone(&Utc));
            }
            parse_naive(trimmed).map_err(|_| rfc_error)
        }
    }
}

fn parse_naive(trimmed: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
}

/// `...T22:00:00 02:00` becomes `...T22:00:00+02:00`
fn restore_offset_sign(input: &str) -> Option<String> {
    let split = input.len().checked_sub(6)?;
    if !input.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = input.split_at(split);
    let offset = tail.strip_prefix(' ')?.as_bytes();
    let well_formed =
        offset[2] == b':' && [0, 1, 3, 4].iter().all(|&i| offset[i].is_ascii_digit());
    (well_formed && head.contains('T')).then(|| format!("{}+{}", head, &tail[1..]))
}

/// Serde helpers for lenient ISO-8601 timestamp fields
pub mod iso8601 {
    use super::{parse_timestamp, Timestamp};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_observation() -> Observation {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        Observation {
            id: "obs-1".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(10),
            name: "night_1".to_string(),
            status: ObservationStatus::Failed,
            problem_report: Some("PR-ABC123".to_string()),
            investigation_report: None,
        }
    }

    #[test]
    fn test_observation_serialization() {
        let observation = sample_observation();

        let json = serde_json::to_string(&observation).unwrap();
        let deserialized: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(observation, deserialized);
    }

    #[test]
    fn test_full_view_keeps_absent_annotations_as_null() {
        let mut observation = sample_observation();
        observation.problem_report = None;

        let value = serde_json::to_value(&observation).unwrap();
        assert!(value["problem_report"].is_null());
        assert!(value["investigation_report"].is_null());
        assert_eq!(value["status"], "Failed");
    }

    #[test]
    fn test_summary_omits_annotations() {
        let value = serde_json::to_value(sample_observation().summary()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert!(!object.contains_key("problem_report"));
        assert!(!object.contains_key("investigation_report"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ObservationStatus::Success).unwrap(),
            "\"Success\""
        );
        assert_eq!(
            serde_json::to_string(&ObservationStatus::Failed).unwrap(),
            "\"Failed\""
        );
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(sample_observation().duration_seconds(), 600.0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T22:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-02T00:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T22:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 22:00:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-01T22:00:00.250").unwrap(),
            expected + Duration::milliseconds(250)
        );
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_restores_decoded_plus_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-02T00:00:00 02:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-02T00:00:00.500 02:00").unwrap(),
            expected + Duration::milliseconds(500)
        );
        assert!(parse_timestamp("2024-03-02T00:00:00 2:00").is_err());
    }

    #[test]
    fn test_empty_ticket_is_not_a_problem_report() {
        let mut observation = sample_observation();
        observation.status = ObservationStatus::Failed;

        observation.problem_report = Some(String::new());
        assert!(!observation.has_problem_report());

        observation.problem_report = Some("PR-000001".to_string());
        assert!(observation.has_problem_report());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2024-13-01T00:00:00").is_err());
    }

    #[test]
    fn test_deserialize_naive_timestamps() {
        let json = r#"{
            "id": "x",
            "start_time": "2024-03-01T22:00:00",
            "end_time": "2024-03-01T22:05:00",
            "name": "n_1",
            "status": "Success"
        }"#;

        let observation: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(observation.problem_report, None);
        assert_eq!(observation.duration_seconds(), 300.0);
    }
}
