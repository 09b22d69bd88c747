//! Observation store owning the observation and investigation report collections
//!
//! All mutating operations take the collection write lock for their full pass,
//! so a batch assignment never interleaves with another mutation. Reads clone a
//! snapshot under the read lock.

use crate::error::StoreError;
use crate::observations::{
    InvestigationReport, Observation, ObservationStatus, ObservationSummary, Timestamp,
};
use crate::random::{problem_report_id, RandomSource, RngSource};
use crate::store::generator::{generate_investigation_reports, generate_observations};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const SUCCESS_REPORT_MESSAGE: &str = "Cannot add a problem report to a successful observation";

/// Tunables for generation and report assignment
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Shortest observation window in minutes
    pub min_duration_minutes: u32,
    /// Longest observation window in minutes
    pub max_duration_minutes: u32,
    /// Chance a failed observation receives a problem report
    pub problem_report_probability: f64,
    /// Chance a reported observation receives an investigation report
    pub investigation_probability: f64,
    /// Number of investigation reports generated per assignment run
    pub investigation_batch_size: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            min_duration_minutes: 5,
            max_duration_minutes: 15,
            problem_report_probability: 0.5,
            investigation_probability: 0.6,
            investigation_batch_size: 20,
        }
    }
}

/// Result of an investigation assignment run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestigationAssignment {
    /// Observations that received a report in this run
    pub assigned_count: usize,
    pub message: String,
}

#[derive(Debug, Default)]
struct Collections {
    observations: Vec<Observation>,
    investigation_reports: Vec<InvestigationReport>,
}

/// In-memory store for the active observation batch
pub struct ObservationStore {
    collections: RwLock<Collections>,
    /// Always locked after `collections`
    random: Mutex<Box<dyn RandomSource>>,
    settings: StoreSettings,
}

impl ObservationStore {
    /// Create an empty store drawing randomness from `random`
    pub fn new(settings: StoreSettings, random: Box<dyn RandomSource>) -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            random: Mutex::new(random),
            settings,
        }
    }

    /// Create an empty store with a reproducible random sequence
    pub fn seeded(settings: StoreSettings, seed: u64) -> Self {
        Self::new(settings, Box::new(RngSource::seeded(seed)))
    }

    /// Replace the active batch with a fresh partition of `[start, end)`
    ///
    /// Returns the new batch. An empty or inverted range clears the store.
    pub fn generate(&self, start: Timestamp, end: Timestamp, base_name: &str) -> Vec<Observation> {
        let mut collections = self.write();
        let mut random = self.random();

        let observations =
            generate_observations(start, end, base_name, &self.settings, &mut **random);
        info!(
            "Generated {} observations named '{}' between {} and {}",
            observations.len(),
            base_name,
            start,
            end
        );

        collections.observations = observations.clone();
        observations
    }

    /// Attach a problem report ticket to a failed observation
    ///
    /// # Errors
    ///
    /// `NotFound` if no observation has `id`, `InvalidState` if the observation
    /// succeeded.
    pub fn update_problem_report(&self, id: &str, ticket: &str) -> Result<Observation, StoreError> {
        let mut collections = self.write();
        let observation = find_mut(&mut collections.observations, id)?;

        if observation.status == ObservationStatus::Success {
            warn!("Rejected problem report {} for successful observation {}", ticket, id);
            return Err(StoreError::InvalidState(SUCCESS_REPORT_MESSAGE.to_string()));
        }

        observation.problem_report = Some(ticket.to_string());
        debug!("Attached problem report {} to observation {}", ticket, id);
        Ok(observation.clone())
    }

    /// Clear the problem report of an observation
    ///
    /// Any investigation report reference is left in place.
    pub fn remove_problem_report(&self, id: &str) -> Result<Observation, StoreError> {
        let mut collections = self.write();
        let observation = find_mut(&mut collections.observations, id)?;

        observation.problem_report = None;
        debug!("Removed problem report from observation {}", id);
        Ok(observation.clone())
    }

    /// Re-roll problem reports across the whole batch
    ///
    /// Successful observations always end up without a report. Failed ones get
    /// a fresh `PR-` ticket with the configured probability, otherwise none.
    /// Investigation references are not touched.
    pub fn assign_problem_reports(&self) -> Vec<Observation> {
        let mut collections = self.write();
        let mut random = self.random();
        let probability = self.settings.problem_report_probability;

        let mut reported = 0;
        for observation in collections.observations.iter_mut() {
            observation.problem_report = match observation.status {
                ObservationStatus::Success => None,
                ObservationStatus::Failed => {
                    if random.chance(probability) {
                        reported += 1;
                        Some(problem_report_id(&mut **random))
                    } else {
                        None
                    }
                }
            };
        }

        info!(
            "Assigned problem reports to {} of {} observations",
            reported,
            collections.observations.len()
        );
        collections.observations.clone()
    }

    /// Regenerate investigation reports and assign them, using the current time
    pub fn assign_investigation_reports(&self) -> InvestigationAssignment {
        self.assign_investigation_reports_at(Utc::now())
    }

    /// Regenerate investigation reports relative to `now` and assign them
    ///
    /// The previous report batch is replaced. Every observation holding a
    /// problem report either gets a report from the new batch or has its
    /// reference cleared. Observations without a problem report keep whatever
    /// reference they already had.
    pub fn assign_investigation_reports_at(&self, now: Timestamp) -> InvestigationAssignment {
        let mut collections = self.write();
        let mut random = self.random();

        let reports = generate_investigation_reports(
            self.settings.investigation_batch_size,
            now,
            &mut **random,
        );
        let probability = self.settings.investigation_probability;

        let mut assigned_count = 0;
        for observation in collections
            .observations
            .iter_mut()
            .filter(|o| o.has_problem_report())
        {
            if !reports.is_empty() && random.chance(probability) {
                let report = &reports[random.pick(reports.len())];
                observation.investigation_report = Some(report.id.clone());
                assigned_count += 1;
            } else {
                observation.investigation_report = None;
            }
        }
        collections.investigation_reports = reports;

        info!(
            "Generated {} investigation reports and assigned them to {} observations",
            collections.investigation_reports.len(),
            assigned_count
        );
        InvestigationAssignment {
            assigned_count,
            message: format!(
                "Investigation reports generated and assigned to {} observations.",
                assigned_count
            ),
        }
    }

    /// Full view of a single observation
    pub fn lookup(&self, id: &str) -> Result<Observation, StoreError> {
        self.read()
            .observations
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Public view of the active batch
    pub fn list_summary(&self) -> Vec<ObservationSummary> {
        self.read()
            .observations
            .iter()
            .map(ObservationSummary::from)
            .collect()
    }

    /// Full view of the active batch
    pub fn list_full(&self) -> Vec<Observation> {
        self.read().observations.clone()
    }

    /// Current investigation report batch
    pub fn investigation_reports(&self) -> Vec<InvestigationReport> {
        self.read().investigation_reports.clone()
    }

    #[cfg(test)]
    pub(crate) fn replace_observations(&self, observations: Vec<Observation>) {
        self.write().observations = observations;
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn random(&self) -> MutexGuard<'_, Box<dyn RandomSource>> {
        self.random.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut<'a>(
    observations: &'a mut [Observation],
    id: &str,
) -> Result<&'a mut Observation, StoreError> {
    observations
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> StoreError {
    warn!("Observation {} not found", id);
    StoreError::NotFound(id.to_string())
}
