//! Run-history statistics and notable-run rankings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pipetimer_types::{RawRun, RunRecord, RESULT_SUCCESS, RESULT_UNKNOWN};
use serde::Serialize;

use super::duration::{format_duration_ms, format_timestamp, DurationStats};
use super::thresholds::Thresholds;
use crate::diagnostics::Diagnostics;

/// Life-cycle state of a run that has finished, successfully or not.
pub const LIFE_CYCLE_TERMINATED: &str = "TERMINATED";

/// A run picked out for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotableRun {
    pub run_id: Option<i64>,
    pub duration_ms: Option<i64>,
    pub duration_str: String,
    /// UTC start time without a zone suffix.
    pub start_time_utc: String,
    pub result_state: Option<String>,
}

impl NotableRun {
    fn from_record(record: &RunRecord) -> Self {
        Self {
            run_id: record.run_id,
            duration_ms: record.execution_duration,
            duration_str: format_duration_ms(record.execution_duration),
            start_time_utc: format_timestamp(record.start_time, false),
            result_state: record.result_state.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotableRuns {
    pub longest: Vec<NotableRun>,
    pub shortest: Vec<NotableRun>,
    /// Most recent non-successful runs, newest first.
    pub recent_failures: Vec<NotableRun>,
}

/// Statistics over a set of completed runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunHistoryReport {
    pub total_runs_analyzed: usize,
    pub period_start_ms: Option<i64>,
    pub period_end_ms: Option<i64>,
    pub period_start_utc: String,
    pub period_end_utc: String,
    /// Absent when no run carries a duration; omitted from JSON then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_stats: Option<DurationStats>,
    /// Percentage of all runs whose result state is `SUCCESS`.
    pub success_rate: f64,
    pub success_rate_percent: String,
    /// Result state to number of runs; a missing state counts as `UNKNOWN`.
    pub status_counts: BTreeMap<String, usize>,
    pub notable_runs: NotableRuns,
}

/// A point for a duration-over-time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    pub run_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: f64,
}

/// Computes history reports from run records.
#[derive(Debug)]
pub struct RunHistoryAnalyzer {
    diagnostics: Box<dyn Diagnostics>,
    thresholds: Thresholds,
}

impl RunHistoryAnalyzer {
    pub fn new(diagnostics: Box<dyn Diagnostics>, thresholds: Thresholds) -> Self {
        Self {
            diagnostics,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Analyze `records`.
    ///
    /// Returns `None` for an empty slice: no runs is not the same as a report
    /// full of zeros.
    pub fn analyze(&self, records: &[RunRecord]) -> Option<RunHistoryReport> {
        if records.is_empty() {
            self.diagnostics.info("No runs provided for history analysis");
            return None;
        }

        let total = records.len();
        self.diagnostics
            .info(&format!("Analyzing run history for {} runs", total));

        let start_times = records.iter().filter_map(|r| r.start_time);
        let period_start_ms = start_times.clone().min();
        let period_end_ms = start_times.max();

        let durations: Vec<f64> = records
            .iter()
            .filter_map(|r| r.execution_duration)
            .map(|d| d as f64)
            .collect();
        let duration_stats = DurationStats::from_millis(&durations);

        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            let state = record.result_state.as_deref().unwrap_or(RESULT_UNKNOWN);
            *status_counts.entry(state.to_string()).or_default() += 1;
        }
        let successes = status_counts.get(RESULT_SUCCESS).copied().unwrap_or(0);
        let success_rate = successes as f64 / total as f64 * 100.0;

        Some(RunHistoryReport {
            total_runs_analyzed: total,
            period_start_ms,
            period_end_ms,
            period_start_utc: format_timestamp(period_start_ms, true),
            period_end_utc: format_timestamp(period_end_ms, true),
            duration_stats,
            success_rate,
            success_rate_percent: format!("{:.2}%", success_rate),
            status_counts,
            notable_runs: self.notable_runs(records),
        })
    }

    fn notable_runs(&self, records: &[RunRecord]) -> NotableRuns {
        let limit = self.thresholds.notable_runs;

        // Stable sorts: ties keep input order.
        let mut by_duration: Vec<&RunRecord> = records.iter().collect();
        by_duration.sort_by(|a, b| {
            let a = a.execution_duration.unwrap_or(0);
            let b = b.execution_duration.unwrap_or(0);
            b.cmp(&a)
        });
        let longest = by_duration
            .iter()
            .take(limit)
            .map(|r| NotableRun::from_record(r))
            .collect();
        let shortest = by_duration
            .iter()
            .rev()
            .take(limit)
            .map(|r| NotableRun::from_record(r))
            .collect();

        let mut by_start: Vec<&RunRecord> = records.iter().collect();
        by_start.sort_by(|a, b| {
            let a = a.start_time.unwrap_or(0);
            let b = b.start_time.unwrap_or(0);
            b.cmp(&a)
        });
        let recent_failures = by_start
            .into_iter()
            .filter(|r| is_failure(r.result_state.as_deref()))
            .take(limit)
            .map(NotableRun::from_record)
            .collect();

        NotableRuns {
            longest,
            shortest,
            recent_failures,
        }
    }

    /// Turn a runs listing into history records.
    ///
    /// Keeps terminated runs that have a start time and a duration,
    /// optionally only those whose result state is in `result_filter`. The
    /// records come back oldest first.
    pub fn select_completed_runs(
        &self,
        runs: &[RawRun],
        result_filter: Option<&[&str]>,
    ) -> Vec<RunRecord> {
        let mut selected: Vec<RunRecord> = runs
            .iter()
            .filter(|run| run.life_cycle_state() == Some(LIFE_CYCLE_TERMINATED))
            .filter(|run| match result_filter {
                Some(states) if !states.is_empty() => run
                    .result_state()
                    .is_some_and(|state| states.contains(&state)),
                _ => true,
            })
            .filter_map(|run| {
                Some(RunRecord {
                    run_id: run.run_id,
                    start_time: Some(run.start_time?),
                    execution_duration: Some(run.execution_duration?),
                    result_state: run.result_state().map(str::to_string),
                })
            })
            .collect();
        selected.sort_by_key(|r| r.start_time);

        self.diagnostics.debug(&format!(
            "Selected {} of {} listed runs",
            selected.len(),
            runs.len()
        ));
        selected
    }

    /// Chart points for runs that have both a start time and a duration.
    pub fn plot_points(&self, records: &[RunRecord]) -> Vec<DurationPoint> {
        let mut points = Vec::with_capacity(records.len());
        for record in records {
            let start = record
                .start_time
                .and_then(DateTime::<Utc>::from_timestamp_millis);
            match (start, record.execution_duration) {
                (Some(start_time), Some(duration)) => points.push(DurationPoint {
                    run_id: record.run_id,
                    start_time,
                    duration_minutes: duration as f64 / 60_000.0,
                }),
                _ => self.diagnostics.warn(&format!(
                    "Skipping run {} for plotting: missing start time or duration",
                    record
                        .run_id
                        .map_or_else(|| "without id".to_string(), |id| id.to_string())
                )),
            }
        }
        points
    }
}

/// Anything but an explicit `SUCCESS` or `UNKNOWN`, including a missing state.
fn is_failure(state: Option<&str>) -> bool {
    state != Some(RESULT_SUCCESS) && state != Some(RESULT_UNKNOWN)
}
