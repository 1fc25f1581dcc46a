//! Single-pass aggregation of a Spark execution event log.
//!
//! [`EventLogAggregator`] folds listener events, one line at a time, into
//! arenas of job and stage records keyed by id plus a set of running
//! counters. A job's stage ids are plain ids, resolved against the stage
//! arena on demand with [`ParsedEventLog::stages_for_job`].
//!
//! Malformed lines and events that reference unknown ids are reported through
//! the aggregator's [`Diagnostics`] and skipped; only a source that cannot be
//! opened or read fails the pass.

use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;

use pipetimer_types::{
    ApplicationEnd, ApplicationStart, JobEnd, JobId, JobStart, LogEvent, StageCompleted, StageId,
    StageSubmitted, JOB_SUCCEEDED,
};
use serde::Serialize;

use super::duration::{format_duration_ms, format_timestamp};
use super::metrics::{AggregateMetrics, StageMetrics};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::source::{FileSource, LogSource};

/// Status recorded on a stage that completed without reporting one.
pub const STAGE_STATUS_UNKNOWN: &str = "UNKNOWN";

/// Status shown for a stage that has not completed.
pub const STAGE_STATUS_RUNNING: &str = "RUNNING";

/// Lifecycle of a Spark job within the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Started, no end event seen yet.
    Running,
    Succeeded,
    /// Ended with any result tag other than `JobSucceeded`.
    Failed,
    /// Ended without a result tag.
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Application-level facts from the start and end events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationInfo {
    pub name: Option<String>,
    pub id: Option<String>,
    pub user: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// `end - start`, once both are known.
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub submission_time: Option<i64>,
    /// Ids into the stage arena.
    pub stage_ids: Vec<StageId>,
    pub status: JobStatus,
    /// Raw result tag from the end event.
    pub result: Option<String>,
    pub completion_time: Option<i64>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage_id: StageId,
    pub name: Option<String>,
    pub details: Option<String>,
    pub submission_time: Option<i64>,
    pub completion_time: Option<i64>,
    /// Declared task count at submission.
    pub num_tasks: Option<u64>,
    /// `None` until the stage completes.
    pub status: Option<String>,
    pub failure_reason: Option<String>,
    pub duration_ms: Option<i64>,
    pub metrics: StageMetrics,
}

impl StageRecord {
    pub fn is_completed(&self) -> bool {
        self.status.is_some()
    }
}

/// Everything one pass over an event log produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedEventLog {
    pub application: ApplicationInfo,
    pub jobs: BTreeMap<JobId, JobRecord>,
    pub stages: BTreeMap<StageId, StageRecord>,
    pub metrics: AggregateMetrics,
}

impl ParsedEventLog {
    /// Stage records belonging to `job_id`, in the job's declared order.
    ///
    /// Stage ids that were never submitted are left out.
    pub fn stages_for_job(&self, job_id: JobId) -> Vec<&StageRecord> {
        let Some(job) = self.jobs.get(&job_id) else {
            return Vec::new();
        };
        job.stage_ids
            .iter()
            .filter_map(|id| self.stages.get(id))
            .collect()
    }

    /// Presentation view with formatted durations and timestamps.
    pub fn summary(&self) -> EventLogSummary {
        let app = &self.application;
        let application = ApplicationSummary {
            name: app.name.clone(),
            id: app.id.clone(),
            user: app.user.clone(),
            start_time_utc: format_timestamp(app.start_time, true),
            end_time_utc: format_timestamp(app.end_time, true),
            duration_ms: app.duration_ms,
            duration: format_duration_ms(app.duration_ms),
        };

        let jobs = self
            .jobs
            .values()
            .map(|job| JobSummaryEntry {
                job_id: job.job_id,
                status: job.status,
                result: job.result.clone(),
                duration_ms: job.duration_ms,
                duration: format_duration_ms(job.duration_ms),
                stage_ids: job.stage_ids.clone(),
            })
            .collect();

        let stages = self
            .stages
            .values()
            .map(|stage| StageSummaryEntry {
                stage_id: stage.stage_id,
                name: stage.name.clone(),
                status: stage
                    .status
                    .clone()
                    .unwrap_or_else(|| STAGE_STATUS_RUNNING.to_string()),
                num_tasks: stage.num_tasks,
                duration_ms: stage.duration_ms,
                duration: format_duration_ms(stage.duration_ms),
                failure_reason: stage.failure_reason.clone(),
            })
            .collect();

        let m = &self.metrics;
        EventLogSummary {
            application,
            job_summary: JobSummary {
                total_jobs: m.total_jobs,
                succeeded_jobs: m.succeeded_jobs,
                failed_jobs: m.failed_jobs,
                jobs,
            },
            stage_summary: StageSummary {
                total_stages: m.total_stages,
                total_tasks: m.total_tasks,
                stages,
            },
            aggregate_metrics: StageMetrics {
                shuffle_read_bytes: m.shuffle_read_bytes,
                shuffle_write_bytes: m.shuffle_write_bytes,
                input_bytes: m.input_bytes,
                output_bytes: m.output_bytes,
            },
            skipped_lines: m.skipped_lines,
            negative_durations: m.negative_durations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationSummary {
    pub name: Option<String>,
    pub id: Option<String>,
    pub user: Option<String>,
    pub start_time_utc: String,
    pub end_time_utc: String,
    pub duration_ms: Option<i64>,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummaryEntry {
    pub job_id: JobId,
    pub status: JobStatus,
    pub result: Option<String>,
    pub duration_ms: Option<i64>,
    pub duration: String,
    pub stage_ids: Vec<StageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub total_jobs: u64,
    pub succeeded_jobs: u64,
    pub failed_jobs: u64,
    pub jobs: Vec<JobSummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummaryEntry {
    pub stage_id: StageId,
    pub name: Option<String>,
    pub status: String,
    pub num_tasks: Option<u64>,
    pub duration_ms: Option<i64>,
    pub duration: String,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub total_stages: u64,
    pub total_tasks: u64,
    pub stages: Vec<StageSummaryEntry>,
}

/// Serializable summary of one parsed event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogSummary {
    pub application: ApplicationSummary,
    pub job_summary: JobSummary,
    pub stage_summary: StageSummary,
    pub aggregate_metrics: StageMetrics,
    pub skipped_lines: u64,
    pub negative_durations: u64,
}

/// Folds event-log lines into a [`ParsedEventLog`].
///
/// One instance serves one pass: [`parse_source`](Self::parse_source) and
/// [`parse_file`](Self::parse_file) consume the aggregator.
///
/// # Example
///
/// ```
/// use pipetimer::{EventLogAggregator, TracingDiagnostics};
///
/// let mut aggregator = EventLogAggregator::new(TracingDiagnostics::boxed("event_log"));
/// aggregator.process_line(1, r#"{"Event":"SparkListenerJobStart","Job ID":1,"Submission Time":1000,"Stage IDs":[1]}"#);
/// aggregator.process_line(2, r#"{"Event":"SparkListenerJobEnd","Job ID":1,"Completion Time":1500,"Job Result":{"Result":"JobSucceeded"}}"#);
///
/// let parsed = aggregator.into_parsed();
/// assert_eq!(parsed.jobs[&1].duration_ms, Some(500));
/// assert_eq!(parsed.metrics.succeeded_jobs, 1);
/// ```
#[derive(Debug)]
pub struct EventLogAggregator {
    state: ParsedEventLog,
    diagnostics: Box<dyn Diagnostics>,
}

impl EventLogAggregator {
    pub fn new(diagnostics: Box<dyn Diagnostics>) -> Self {
        Self {
            state: ParsedEventLog::default(),
            diagnostics,
        }
    }

    /// Read every line of `source`.
    ///
    /// Fails when the source cannot be opened or a read fails part-way; no
    /// partial result is returned in either case.
    pub fn parse_source(mut self, source: &dyn LogSource) -> Result<ParsedEventLog> {
        self.diagnostics
            .info(&format!("Parsing event log from {}", source.description()));

        let outcome = source.open().and_then(|reader| self.consume(reader));
        if let Err(e) = outcome {
            self.diagnostics.error(&format!(
                "Failed to parse event log from {}: {}",
                source.description(),
                e
            ));
            return Err(e);
        }

        let m = &self.state.metrics;
        self.diagnostics.info(&format!(
            "Finished parsing {}: {} jobs, {} stages, {} skipped lines",
            source.description(),
            m.total_jobs,
            m.total_stages,
            m.skipped_lines
        ));
        Ok(self.state)
    }

    /// Parse the event log at `path`, gunzipping when needed.
    pub fn parse_file<P: AsRef<Path>>(self, path: P) -> Result<ParsedEventLog> {
        self.parse_source(&FileSource::new(path))
    }

    /// Process every line of `reader`.
    ///
    /// Lines are read as raw bytes so one line of invalid UTF-8 is skipped
    /// like any other malformed line.
    pub fn consume<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            line_no += 1;
            match std::str::from_utf8(&buf) {
                Ok(line) => self.process_line(line_no, line),
                Err(e) => self.skip_line(line_no, &e),
            }
        }
    }

    /// Parse one line and apply it. Blank lines are ignored.
    pub fn process_line(&mut self, line_no: usize, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<LogEvent>(line) {
            Ok(event) => self.apply(event),
            Err(e) => self.skip_line(line_no, &e),
        }
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: LogEvent) {
        match event {
            LogEvent::ApplicationStart(start) => self.on_application_start(start),
            LogEvent::ApplicationEnd(end) => self.on_application_end(end),
            LogEvent::JobStart(start) => self.on_job_start(start),
            LogEvent::JobEnd(end) => self.on_job_end(end),
            LogEvent::StageSubmitted(submitted) => self.on_stage_submitted(submitted),
            LogEvent::StageCompleted(completed) => self.on_stage_completed(completed),
            LogEvent::Other => {}
        }
    }

    pub fn parsed(&self) -> &ParsedEventLog {
        &self.state
    }

    pub fn into_parsed(self) -> ParsedEventLog {
        self.state
    }

    /// Summary of the state so far. Does not modify it.
    pub fn summary(&self) -> EventLogSummary {
        self.state.summary()
    }

    pub fn stages_for_job(&self, job_id: JobId) -> Vec<&StageRecord> {
        self.state.stages_for_job(job_id)
    }

    fn skip_line(&mut self, line_no: usize, reason: &dyn fmt::Display) {
        self.state.metrics.skipped_lines += 1;
        self.diagnostics
            .warn(&format!("Skipping line {}: not a valid event ({})", line_no, reason));
    }

    fn on_application_start(&mut self, start: ApplicationStart) {
        let app = &mut self.state.application;
        app.name = start.app_name;
        app.id = start.app_id;
        app.user = start.user;
        app.start_time = start.timestamp;
    }

    fn on_application_end(&mut self, end: ApplicationEnd) {
        let app = &mut self.state.application;
        app.end_time = end.timestamp;
        app.duration_ms = derive_duration(
            app.start_time,
            app.end_time,
            &mut self.state.metrics,
            self.diagnostics.as_ref(),
            "application",
        );
    }

    fn on_job_start(&mut self, start: JobStart) {
        let job_id = start.job_id;
        let record = JobRecord {
            job_id,
            submission_time: start.submission_time,
            stage_ids: start.stage_ids,
            status: JobStatus::Running,
            result: None,
            completion_time: None,
            duration_ms: None,
        };
        if self.state.jobs.insert(job_id, record).is_some() {
            self.diagnostics
                .debug(&format!("Job {} started again, replacing earlier record", job_id));
        }
        self.state.metrics.total_jobs += 1;
    }

    fn on_job_end(&mut self, end: JobEnd) {
        let Some(job) = self.state.jobs.get_mut(&end.job_id) else {
            self.diagnostics
                .debug(&format!("Ignoring end of job {} that never started", end.job_id));
            return;
        };

        let result = end.result();
        job.status = match result {
            Some(JOB_SUCCEEDED) => JobStatus::Succeeded,
            Some(_) => JobStatus::Failed,
            None => JobStatus::Unknown,
        };
        job.result = result.map(str::to_string);
        job.completion_time = end.completion_time;
        job.duration_ms = derive_duration(
            job.submission_time,
            job.completion_time,
            &mut self.state.metrics,
            self.diagnostics.as_ref(),
            format_args!("job {}", end.job_id),
        );

        if result == Some(JOB_SUCCEEDED) {
            self.state.metrics.succeeded_jobs += 1;
        } else {
            self.state.metrics.failed_jobs += 1;
        }
    }

    fn on_stage_submitted(&mut self, submitted: StageSubmitted) {
        let info = submitted.stage_info;
        let stage_id = info.stage_id;
        let num_tasks = info.num_tasks;
        let record = StageRecord {
            stage_id,
            name: info.name,
            details: info.details,
            submission_time: info.submission_time,
            completion_time: None,
            num_tasks,
            status: None,
            failure_reason: None,
            duration_ms: None,
            metrics: StageMetrics::default(),
        };
        if self.state.stages.insert(stage_id, record).is_some() {
            self.diagnostics.debug(&format!(
                "Stage {} submitted again (retry), replacing earlier record",
                stage_id
            ));
        }
        let metrics = &mut self.state.metrics;
        metrics.total_stages += 1;
        metrics.total_tasks = metrics.total_tasks.saturating_add(num_tasks.unwrap_or(0));
    }

    fn on_stage_completed(&mut self, completed: StageCompleted) {
        let info = completed.stage_info;
        let Some(stage) = self.state.stages.get_mut(&info.stage_id) else {
            self.diagnostics.debug(&format!(
                "Ignoring completion of stage {} that was never submitted",
                info.stage_id
            ));
            return;
        };

        let metrics = StageMetrics::from_stage_info(&info);

        stage.completion_time = info.completion_time;
        stage.status = Some(
            info.status
                .unwrap_or_else(|| STAGE_STATUS_UNKNOWN.to_string()),
        );
        if let Some(reason) = info.failure_reason.filter(|r| !r.is_empty()) {
            stage.failure_reason = Some(reason);
        }
        if stage.submission_time.is_none() {
            stage.submission_time = info.submission_time;
        }
        stage.duration_ms = derive_duration(
            stage.submission_time,
            stage.completion_time,
            &mut self.state.metrics,
            self.diagnostics.as_ref(),
            format_args!("stage {}", info.stage_id),
        );
        stage.metrics = metrics;
        self.state.metrics.merge_stage(&metrics);
    }
}

/// `end - start` when both are known.
///
/// A negative result is kept as-is so it renders as an invalid duration, and
/// is counted and reported.
fn derive_duration(
    start: Option<i64>,
    end: Option<i64>,
    metrics: &mut AggregateMetrics,
    diagnostics: &dyn Diagnostics,
    what: impl fmt::Display,
) -> Option<i64> {
    let duration = end?.checked_sub(start?)?;
    if duration < 0 {
        metrics.negative_durations += 1;
        diagnostics.warn(&format!(
            "Negative duration for {}: {} ms (ends before it starts)",
            what, duration
        ));
    }
    Some(duration)
}
