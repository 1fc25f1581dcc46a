//! Normalization of a single run into a report-ready summary.

use pipetimer_types::{Autoscale, ClusterSpec, RawRun, RawRunOutput, RESULT_SUCCESS};
use serde::Serialize;

use super::duration::{format_duration_ms, format_timestamp, NOT_AVAILABLE};
use super::thresholds::Thresholds;
use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatus {
    pub life_cycle_state: String,
    pub result_state: String,
    /// Result state equals `SUCCESS`, ignoring case.
    pub is_success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTiming {
    pub start_time_utc: String,
    pub end_time_utc: String,
    pub duration_str: String,
    pub duration_ms: Option<i64>,
}

/// Where the run executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterInfo {
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub node_type: String,
    pub driver_node_type: String,
    /// A worker count, an autoscaling range, or a placeholder.
    pub num_workers: String,
    pub spark_version: String,
}

/// Presence flags for a run's output. Payloads other than the error
/// message are never copied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutputSummary {
    pub error_message: Option<String>,
    pub error_trace_present: bool,
    pub notebook_result_present: bool,
    /// Only known when a notebook result is present.
    pub notebook_output_truncated: Option<bool>,
    pub standard_logs_truncated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Option<i64>,
    pub run_name: String,
    pub notebook_path: String,
    pub job_id: Option<i64>,
    pub run_page_url: String,
    pub status: RunStatus,
    pub timing: RunTiming,
    pub cluster_info: ClusterInfo,
    pub alerts: Vec<String>,
    /// Present only when run output was supplied.
    pub run_output_summary: Option<RunOutputSummary>,
}

/// Builds [`RunSummary`] values from raw run descriptions.
#[derive(Debug)]
pub struct RunDetailProcessor {
    diagnostics: Box<dyn Diagnostics>,
    thresholds: Thresholds,
}

impl RunDetailProcessor {
    pub fn new(diagnostics: Box<dyn Diagnostics>, thresholds: Thresholds) -> Self {
        Self {
            diagnostics,
            thresholds,
        }
    }

    /// Summarize `run`, folding in `output` when the run's output was
    /// fetched (typically only for failed runs).
    pub fn process(&self, run: Option<&RawRun>, output: Option<&RawRunOutput>) -> Option<RunSummary> {
        let Some(run) = run else {
            self.diagnostics.warn("No run data provided to process");
            return None;
        };
        self.diagnostics.info(&format!(
            "Processing run {}",
            run.run_id.map_or_else(|| NOT_AVAILABLE.to_string(), |id| id.to_string())
        ));

        let result_state = run.result_state().unwrap_or(NOT_AVAILABLE).to_string();
        let status = RunStatus {
            life_cycle_state: run.life_cycle_state().unwrap_or(NOT_AVAILABLE).to_string(),
            is_success: result_state.eq_ignore_ascii_case(RESULT_SUCCESS),
            result_state,
        };

        let timing = RunTiming {
            start_time_utc: format_timestamp(run.start_time, true),
            end_time_utc: format_timestamp(run.end_time, true),
            duration_str: format_duration_ms(run.execution_duration),
            duration_ms: run.execution_duration,
        };

        let alerts = self.alerts(&status, &timing, output);
        let run_output_summary = output.map(summarize_output);

        Some(RunSummary {
            run_id: run.run_id,
            run_name: or_not_available(run.run_name.as_deref()),
            notebook_path: or_not_available(run.notebook_path.as_deref()),
            job_id: run.job_id,
            run_page_url: or_not_available(run.run_page_url.as_deref()),
            status,
            timing,
            cluster_info: resolve_cluster(run.cluster_spec.as_ref()),
            alerts,
            run_output_summary,
        })
    }

    fn alerts(&self, status: &RunStatus, timing: &RunTiming, output: Option<&RawRunOutput>) -> Vec<String> {
        let mut alerts = Vec::new();

        if !status.is_success {
            let mut alert = format!("Run did not succeed. Result State: {}", status.result_state);
            if let Some(error) = output.and_then(|o| o.error.as_deref()).filter(|e| !e.is_empty()) {
                alert.push_str(" | Error: ");
                alert.push_str(&excerpt(error, self.thresholds.error_excerpt_chars));
            }
            alerts.push(alert);
        }

        if timing
            .duration_ms
            .is_some_and(|ms| ms > self.thresholds.long_run_threshold_ms)
        {
            alerts.push(format!(
                "Run duration ({}) is significant.",
                timing.duration_str
            ));
        }

        alerts
    }
}

fn or_not_available(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// The first `max_chars` characters of `text`, with "..." appended when
/// anything was cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn autoscale_range(autoscale: &Autoscale) -> String {
    let bound = |b: Option<u32>| b.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string());
    format!(
        "Autoscaling ({}-{})",
        bound(autoscale.min_workers),
        bound(autoscale.max_workers)
    )
}

fn resolve_cluster(spec: Option<&ClusterSpec>) -> ClusterInfo {
    let spec = spec.filter(|s| !s.is_empty());
    let new_cluster = spec.and_then(|s| s.new_cluster.as_ref());

    let existing_id = spec
        .and_then(|s| s.existing_cluster_id.as_deref())
        .filter(|id| !id.is_empty());

    let (cluster_type, num_workers) = match (existing_id, spec) {
        (Some(id), Some(spec)) => {
            let workers = match (spec.num_workers, &spec.autoscale) {
                (Some(n), _) => n.to_string(),
                (None, Some(autoscale)) => autoscale_range(autoscale),
                (None, None) => "N/A (details not fully resolved)".to_string(),
            };
            (format!("Existing Cluster: {}", id), workers)
        }
        (None, Some(spec)) => {
            let workers = spec
                .num_workers
                .or_else(|| new_cluster.and_then(|c| c.num_workers))
                .map(|n| n.to_string())
                .or_else(|| {
                    spec.autoscale
                        .as_ref()
                        .or_else(|| new_cluster.and_then(|c| c.autoscale.as_ref()))
                        .map(autoscale_range)
                })
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            ("New Job Cluster".to_string(), workers)
        }
        _ => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    // Inline fields win over the nested new-cluster definition.
    let field = |inline: Option<&String>, nested: Option<&String>| {
        or_not_available(inline.or(nested).map(String::as_str))
    };

    ClusterInfo {
        cluster_type,
        node_type: field(
            spec.and_then(|s| s.node_type_id.as_ref()),
            new_cluster.and_then(|c| c.node_type_id.as_ref()),
        ),
        driver_node_type: field(
            spec.and_then(|s| s.driver_node_type_id.as_ref()),
            new_cluster.and_then(|c| c.driver_node_type_id.as_ref()),
        ),
        num_workers,
        spark_version: field(
            spec.and_then(|s| s.spark_version.as_ref()),
            new_cluster.and_then(|c| c.spark_version.as_ref()),
        ),
    }
}

fn summarize_output(output: &RawRunOutput) -> RunOutputSummary {
    let notebook_result_present = output
        .notebook_output
        .as_ref()
        .and_then(|n| n.result.as_deref())
        .is_some_and(|r| !r.is_empty());

    RunOutputSummary {
        error_message: output.error.clone().filter(|e| !e.is_empty()),
        error_trace_present: output.error_trace.as_deref().is_some_and(|t| !t.is_empty()),
        notebook_result_present,
        notebook_output_truncated: notebook_result_present.then(|| {
            output
                .notebook_output
                .as_ref()
                .and_then(|n| n.truncated)
                .unwrap_or(false)
        }),
        standard_logs_truncated: output.logs_truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingDiagnostics, Severity};
    use serde_json::json;

    fn processor() -> RunDetailProcessor {
        RunDetailProcessor::new(CollectingDiagnostics::new().handle(), Thresholds::default())
    }

    fn raw(value: serde_json::Value) -> RawRun {
        serde_json::from_value(value).unwrap()
    }

    fn output(value: serde_json::Value) -> RawRunOutput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_none_input() {
        let collector = CollectingDiagnostics::new();
        let processor = RunDetailProcessor::new(collector.handle(), Thresholds::default());
        assert!(processor.process(None, None).is_none());
        assert_eq!(collector.count(Severity::Warning), 1);
    }

    #[test]
    fn test_successful_run() {
        let run = raw(json!({
            "run_id": 42,
            "job_id": 7,
            "run_name": "nightly",
            "state": {"life_cycle_state": "TERMINATED", "result_state": "SUCCESS"},
            "start_time": 0,
            "end_time": 61000,
            "execution_duration": 61000,
            "run_page_url": "https://example.cloud.databricks.com/#job/7/run/42"
        }));
        let summary = processor().process(Some(&run), None).unwrap();

        assert_eq!(summary.run_id, Some(42));
        assert_eq!(summary.job_id, Some(7));
        assert_eq!(summary.run_name, "nightly");
        assert_eq!(summary.notebook_path, "N/A");
        assert!(summary.status.is_success);
        assert_eq!(summary.status.life_cycle_state, "TERMINATED");
        assert_eq!(summary.timing.start_time_utc, "1970-01-01 00:00:00 UTC");
        assert_eq!(summary.timing.duration_str, "1m 1.00s");
        assert!(summary.alerts.is_empty());
        assert!(summary.run_output_summary.is_none());
        assert_eq!(summary.cluster_info.cluster_type, "N/A");
    }

    #[test]
    fn test_success_is_case_insensitive() {
        let run = raw(json!({"run_id": 1, "result_state": "success"}));
        let summary = processor().process(Some(&run), None).unwrap();
        assert!(summary.status.is_success);
        assert!(summary.alerts.is_empty());
    }

    #[test]
    fn test_missing_result_state_alerts() {
        let run = raw(json!({"run_id": 1}));
        let summary = processor().process(Some(&run), None).unwrap();
        assert_eq!(summary.status.result_state, "N/A");
        assert_eq!(summary.alerts, vec!["Run did not succeed. Result State: N/A"]);
    }

    #[test]
    fn test_failure_alert_with_truncated_error() {
        let run = raw(json!({"run_id": 1, "result_state": "FAILED", "duration_ms": 8_000_000}));
        let long_error = "x".repeat(250);
        let out = output(json!({
            "error": long_error.clone(),
            "error_trace": "Traceback ...",
            "notebook_output": {"result": "partial", "truncated": true},
            "logs_truncated": false
        }));
        let summary = processor().process(Some(&run), Some(&out)).unwrap();

        assert_eq!(summary.alerts.len(), 2);
        let expected = format!(
            "Run did not succeed. Result State: FAILED | Error: {}...",
            "x".repeat(200)
        );
        assert_eq!(summary.alerts[0], expected);
        assert_eq!(summary.alerts[1], "Run duration (2h 13m 20.00s) is significant.");

        let diag = summary.run_output_summary.unwrap();
        assert_eq!(diag.error_message.as_deref(), Some(long_error.as_str()));
        assert!(diag.error_trace_present);
        assert!(diag.notebook_result_present);
        assert_eq!(diag.notebook_output_truncated, Some(true));
        assert_eq!(diag.standard_logs_truncated, Some(false));
    }

    #[test]
    fn test_short_error_has_no_ellipsis() {
        let run = raw(json!({"run_id": 1, "result_state": "FAILED"}));
        let out = output(json!({"error": "boom"}));
        let summary = processor().process(Some(&run), Some(&out)).unwrap();
        assert_eq!(
            summary.alerts,
            vec!["Run did not succeed. Result State: FAILED | Error: boom"]
        );
        let diag = summary.run_output_summary.unwrap();
        assert!(!diag.error_trace_present);
        assert!(!diag.notebook_result_present);
        assert!(diag.notebook_output_truncated.is_none());
        assert!(diag.standard_logs_truncated.is_none());
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("héllo", 2), "hé...");
        assert_eq!(excerpt("héllo", 5), "héllo");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn test_long_run_alert_threshold() {
        let at_threshold = raw(json!({"run_id": 1, "result_state": "SUCCESS", "execution_duration": 7_200_000}));
        let over = raw(json!({"run_id": 2, "result_state": "SUCCESS", "execution_duration": 7_200_001}));
        let p = processor();
        assert!(p.process(Some(&at_threshold), None).unwrap().alerts.is_empty());
        assert_eq!(p.process(Some(&over), None).unwrap().alerts.len(), 1);
    }

    #[test]
    fn test_existing_cluster_with_workers() {
        let run = raw(json!({
            "run_id": 1,
            "result_state": "SUCCESS",
            "cluster_spec": {"existing_cluster_id": "0101-abc", "num_workers": 4, "node_type_id": "i3.xlarge"}
        }));
        let info = processor().process(Some(&run), None).unwrap().cluster_info;
        assert_eq!(info.cluster_type, "Existing Cluster: 0101-abc");
        assert_eq!(info.num_workers, "4");
        assert_eq!(info.node_type, "i3.xlarge");
        assert_eq!(info.driver_node_type, "N/A");
    }

    #[test]
    fn test_existing_cluster_autoscale() {
        let run = raw(json!({
            "run_id": 1,
            "cluster_spec": {"existing_cluster_id": "c1", "autoscale": {"min_workers": 2, "max_workers": 8}}
        }));
        let info = processor().process(Some(&run), None).unwrap().cluster_info;
        assert_eq!(info.num_workers, "Autoscaling (2-8)");
    }

    #[test]
    fn test_existing_cluster_unresolved_workers() {
        let run = raw(json!({"run_id": 1, "cluster_spec": {"existing_cluster_id": "c1"}}));
        let info = processor().process(Some(&run), None).unwrap().cluster_info;
        assert_eq!(info.num_workers, "N/A (details not fully resolved)");
    }

    #[test]
    fn test_new_job_cluster() {
        let run = raw(json!({
            "run_id": 1,
            "cluster_spec": {"new_cluster": {"num_workers": 3, "spark_version": "13.3.x-scala2.12", "node_type_id": "m5.large"}}
        }));
        let info = processor().process(Some(&run), None).unwrap().cluster_info;
        assert_eq!(info.cluster_type, "New Job Cluster");
        assert_eq!(info.num_workers, "3");
        assert_eq!(info.spark_version, "13.3.x-scala2.12");
        assert_eq!(info.node_type, "m5.large");
    }

    #[test]
    fn test_inline_new_cluster_without_workers() {
        let run = raw(json!({"run_id": 1, "cluster_spec": {"spark_version": "12.2.x"}}));
        let info = processor().process(Some(&run), None).unwrap().cluster_info;
        assert_eq!(info.cluster_type, "New Job Cluster");
        assert_eq!(info.num_workers, "N/A");
    }

    #[test]
    fn test_cluster_info_serializes_type_field() {
        let run = raw(json!({"run_id": 1, "cluster_spec": {"existing_cluster_id": "c1", "num_workers": 1}}));
        let summary = processor().process(Some(&run), None).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["cluster_info"]["type"], "Existing Cluster: c1");
        assert_eq!(json["status"]["is_success"], false);
    }
}
