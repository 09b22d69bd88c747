//! Random generation of observation batches and investigation report batches

use crate::observations::{InvestigationReport, Observation, ObservationStatus, Timestamp};
use crate::random::{investigation_report_id, observation_id, RandomSource};
use crate::store::StoreSettings;
use chrono::Duration;

/// Canned narratives for generated investigation reports
pub const INVESTIGATION_NARRATIVES: [&str; 10] = [
    "Dome shutter failed to open fully; motor controller reset resolved the fault.",
    "Guiding lost lock due to passing cloud bank; no hardware issue found.",
    "Detector readout timed out after a firmware watchdog trip.",
    "Filter wheel jammed between positions; technician cleared debris on site.",
    "Cryocooler temperature drifted above threshold during the exposure sequence.",
    "Network link to the instrument controller dropped for several minutes.",
    "Mount tracking error exceeded tolerance near the meridian flip.",
    "High humidity triggered an automatic safety close of the enclosure.",
    "Scheduler submitted an observation block with an invalid target position.",
    "Focus stage encoder reported inconsistent positions; recalibrated.",
];

/// Partition `[start, end)` into consecutive observations
///
/// Each window lasts a whole number of minutes drawn from the configured range.
/// Generation stops before the first window that would end after `end`, so the
/// trailing remainder is dropped. Returns an empty batch when `start >= end`.
pub fn generate_observations(
    start: Timestamp,
    end: Timestamp,
    base_name: &str,
    settings: &StoreSettings,
    random: &mut dyn RandomSource,
) -> Vec<Observation> {
    let mut observations = Vec::new();
    let mut current = start;
    let mut sequence: u32 = 1;

    while current < end {
        let minutes = random.range_inclusive(
            settings.min_duration_minutes,
            settings.max_duration_minutes,
        );
        let window_end = current + Duration::minutes(i64::from(minutes));
        if window_end > end {
            break;
        }

        let status = if random.chance(0.5) {
            ObservationStatus::Success
        } else {
            ObservationStatus::Failed
        };

        observations.push(Observation {
            id: observation_id(random),
            start_time: current,
            end_time: window_end,
            name: format!("{}_{}", base_name, sequence),
            status,
            problem_report: None,
            investigation_report: None,
        });

        current = window_end;
        sequence += 1;
    }

    observations
}

/// Generate a fresh batch of investigation reports
///
/// Each report starts up to a year (plus up to 23h59m) before `now` and lasts
/// between 1 and 72 hours.
pub fn generate_investigation_reports(
    count: usize,
    now: Timestamp,
    random: &mut dyn RandomSource,
) -> Vec<InvestigationReport> {
    (0..count)
        .map(|_| {
            let days_back = random.range_inclusive(0, 365);
            let hours_back = random.range_inclusive(0, 23);
            let minutes_back = random.range_inclusive(0, 59);
            let start_time = now
                - Duration::days(i64::from(days_back))
                - Duration::hours(i64::from(hours_back))
                - Duration::minutes(i64::from(minutes_back));
            let end_time = start_time + Duration::hours(i64::from(random.range_inclusive(1, 72)));

            InvestigationReport {
                id: investigation_report_id(random),
                start_time,
                end_time,
                investigation: INVESTIGATION_NARRATIVES
                    [random.pick(INVESTIGATION_NARRATIVES.len())]
                .to_string(),
            }
        })
        .collect()
}


// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::random::RngSource;
    use chrono::{TimeZone, Utc};
    use quickcheck_macros::quickcheck;

    // Every window lies inside the requested range and windows are contiguous
    #[quickcheck]
    fn prop_partition_covers_range_contiguously(seed: u64, span_minutes: u16) -> bool {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::minutes(i64::from(span_minutes % 600));
        let mut random = RngSource::seeded(seed);

        let observations =
            generate_observations(start, end, "p", &StoreSettings::default(), &mut random);

        let bounded = observations
            .iter()
            .all(|o| start <= o.start_time && o.end_time <= end && o.start_time < o.end_time);
        let contiguous = observations
            .windows(2)
            .all(|pair| pair[0].end_time == pair[1].start_time);
        let starts_at_start = observations
            .first()
            .map_or(true, |first| first.start_time == start);
        let durations_in_range = observations.iter().all(|o| {
            let minutes = (o.end_time - o.start_time).num_minutes();
            (5..=15).contains(&minutes)
        });
        // a dropped remainder is always shorter than the longest window
        let remainder_small = observations
            .last()
            .map_or(end - start < Duration::minutes(15), |last| {
                end - last.end_time < Duration::minutes(15)
            });

        bounded && contiguous && starts_at_start && durations_in_range && remainder_small
    }
}
