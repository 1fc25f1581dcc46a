//! Plain-text rendering of reports.
//!
//! JSON output needs no help here: every report type is `Serialize` and the
//! binary pretty-prints it with `serde_json`.

use crate::data::duration::NOT_AVAILABLE;
use crate::data::{EventLogSummary, JobDetails, RunHistoryReport, RunSummary};

const NO_DATA: &str = "No analysis results to report.";

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Render a single run's summary.
pub fn render_run_summary(summary: Option<&RunSummary>) -> String {
    let Some(summary) = summary else {
        return NO_DATA.to_string();
    };

    let mut lines = vec![
        "--- pipetimer Run Summary ---".to_string(),
        format!("Run ID: {}", or_na(summary.run_id)),
        format!("Run Name: {}", summary.run_name),
        format!("Notebook Path: {}", summary.notebook_path),
    ];
    if let Some(job_id) = summary.job_id {
        lines.push(format!("Databricks Job ID: {}", job_id));
    }
    lines.push(format!("Run Page URL: {}", summary.run_page_url));

    let status = &summary.status;
    lines.push(String::new());
    lines.push("[Status]".to_string());
    lines.push(format!("  Life Cycle State: {}", status.life_cycle_state));
    lines.push(format!("  Result State: {}", status.result_state));

    let timing = &summary.timing;
    lines.push(String::new());
    lines.push("[Timing]".to_string());
    lines.push(format!("  Start Time (UTC): {}", timing.start_time_utc));
    lines.push(format!("  End Time (UTC): {}", timing.end_time_utc));
    lines.push(format!("  Duration: {}", timing.duration_str));

    let cluster = &summary.cluster_info;
    lines.push(String::new());
    lines.push("[Cluster Information]".to_string());
    lines.push(format!("  Type: {}", cluster.cluster_type));
    lines.push(format!("  Node Type: {}", cluster.node_type));
    if cluster.driver_node_type != NOT_AVAILABLE {
        lines.push(format!("  Driver Node Type: {}", cluster.driver_node_type));
    }
    lines.push(format!("  Num Workers: {}", cluster.num_workers));
    lines.push(format!("  Spark Version: {}", cluster.spark_version));

    if !summary.alerts.is_empty() {
        lines.push(String::new());
        lines.push("[Alerts & Observations]".to_string());
        lines.extend(summary.alerts.iter().map(|a| format!("  - {}", a)));
    }

    if let Some(output) = &summary.run_output_summary {
        lines.push(String::new());
        lines.push("[Run Output Diagnostics]".to_string());
        if let Some(error) = &output.error_message {
            lines.push(format!("  Error Message: {}", error));
        }
        if output.error_trace_present {
            lines.push("  Error Traceback: available in the run output".to_string());
        }
        if output.notebook_result_present {
            let truncated = if output.notebook_output_truncated == Some(true) {
                " (truncated)"
            } else {
                ""
            };
            lines.push(format!(
                "  Notebook Result: available in the run output{}",
                truncated
            ));
        }
        if output.standard_logs_truncated == Some(true) {
            lines.push("  Standard Logs: truncated".to_string());
        }
    }

    lines.join("\n")
}

/// Render an event-log summary.
pub fn render_event_log(summary: &EventLogSummary) -> String {
    let app = &summary.application;
    let mut lines = vec![
        "--- pipetimer Event Log Summary ---".to_string(),
        format!("Application: {}", or_na(app.name.as_deref())),
        format!("Application ID: {}", or_na(app.id.as_deref())),
        format!("User: {}", or_na(app.user.as_deref())),
        format!("Start Time: {}", app.start_time_utc),
        format!("End Time: {}", app.end_time_utc),
        format!("Duration: {}", app.duration),
    ];

    let jobs = &summary.job_summary;
    lines.push(String::new());
    lines.push(format!(
        "[Jobs] total: {}, succeeded: {}, failed: {}",
        jobs.total_jobs, jobs.succeeded_jobs, jobs.failed_jobs
    ));
    for job in &jobs.jobs {
        lines.push(format!(
            "  Job {:<6} {:<10} {:>16}  stages: {:?}",
            job.job_id, job.status, job.duration, job.stage_ids
        ));
    }

    let stages = &summary.stage_summary;
    lines.push(String::new());
    lines.push(format!(
        "[Stages] total: {}, tasks: {}",
        stages.total_stages, stages.total_tasks
    ));
    for stage in &stages.stages {
        let mut line = format!(
            "  Stage {:<6} {:<10} {:>16}  {}",
            stage.stage_id,
            stage.status,
            stage.duration,
            or_na(stage.name.as_deref())
        );
        if let Some(reason) = &stage.failure_reason {
            line.push_str(&format!(" (failed: {})", reason));
        }
        lines.push(line);
    }

    let m = &summary.aggregate_metrics;
    lines.push(String::new());
    lines.push("[I/O]".to_string());
    lines.push(format!("  Shuffle Read:  {} bytes", m.shuffle_read_bytes));
    lines.push(format!("  Shuffle Write: {} bytes", m.shuffle_write_bytes));
    lines.push(format!("  Input:         {} bytes", m.input_bytes));
    lines.push(format!("  Output:        {} bytes", m.output_bytes));

    if summary.skipped_lines > 0 || summary.negative_durations > 0 {
        lines.push(String::new());
        lines.push("[Log Quality]".to_string());
        lines.push(format!("  Skipped lines: {}", summary.skipped_lines));
        lines.push(format!("  Negative durations: {}", summary.negative_durations));
    }

    lines.join("\n")
}

/// Render a run-history report. `None` renders the no-data message.
pub fn render_history(report: Option<&RunHistoryReport>) -> String {
    let Some(report) = report else {
        return "No runs to analyze.".to_string();
    };

    let mut lines = vec![
        "--- pipetimer Run History ---".to_string(),
        format!("Runs analyzed: {}", report.total_runs_analyzed),
        format!(
            "Period: {} to {}",
            report.period_start_utc, report.period_end_utc
        ),
        format!("Success rate: {}", report.success_rate_percent),
    ];

    lines.push(String::new());
    lines.push("[Durations]".to_string());
    match &report.duration_stats {
        Some(stats) => {
            let f = &stats.formatted;
            lines.push(format!("  Min:     {}", f.min));
            lines.push(format!("  Max:     {}", f.max));
            lines.push(format!("  Mean:    {}", f.mean));
            lines.push(format!("  Median:  {}", f.median));
            lines.push(format!("  Std Dev: {}", f.std_dev));
        }
        None => lines.push("  No durations recorded".to_string()),
    }

    lines.push(String::new());
    lines.push("[Result States]".to_string());
    lines.extend(
        report
            .status_counts
            .iter()
            .map(|(state, count)| format!("  {}: {}", state, count)),
    );

    let notable = &report.notable_runs;
    for (title, runs) in [
        ("Longest Runs", &notable.longest),
        ("Shortest Runs", &notable.shortest),
        ("Recent Failures", &notable.recent_failures),
    ] {
        lines.push(String::new());
        lines.push(format!("[{}]", title));
        if runs.is_empty() {
            lines.push("  None".to_string());
        }
        for run in runs {
            lines.push(format!(
                "  {:<12} {:>16}  {}  {}",
                or_na(run.run_id),
                run.duration_str,
                run.start_time_utc,
                or_na(run.result_state.as_deref())
            ));
        }
    }

    lines.join("\n")
}

/// Render a job definition.
pub fn render_job_details(details: Option<&JobDetails>) -> String {
    let Some(details) = details else {
        return NO_DATA.to_string();
    };

    let mut lines = vec![
        "--- pipetimer Job Definition ---".to_string(),
        format!("Job ID: {}", or_na(details.job_id)),
        format!("Name: {}", details.name),
        format!("Creator: {}", details.creator_user_name),
        format!("Created: {}", details.created_time_utc),
        format!(
            "Schedule: {} ({})",
            details.schedule_cron, details.schedule_timezone
        ),
        format!("Cluster: {}", details.default_cluster_info),
        format!("Max Concurrent Runs: {}", or_na(details.max_concurrent_runs)),
        format!("Timeout (s): {}", or_na(details.timeout_seconds)),
        format!("Retry On Timeout: {}", details.retry_on_timeout),
    ];

    lines.push(String::new());
    lines.push("[Tasks]".to_string());
    lines.extend(details.tasks_summary.iter().map(|t| format!("  - {}", t)));

    lines.push(String::new());
    lines.push("[Notifications]".to_string());
    lines.extend(
        details
            .notification_summary
            .iter()
            .map(|n| format!("  - {}", n)),
    );

    if !details.libraries.is_empty() {
        lines.push(String::new());
        lines.push("[Libraries]".to_string());
        lines.extend(details.libraries.iter().map(|l| format!("  - {}", l)));
    }

    if !details.tags.is_empty() {
        lines.push(String::new());
        lines.push("[Tags]".to_string());
        lines.extend(details.tags.iter().map(|(k, v)| format!("  {}: {}", k, v)));
    }

    lines.join("\n")
}
