//! Summaries of scheduled job definitions.

use std::collections::BTreeMap;

use pipetimer_types::{EmailNotifications, JobSettings, JobTask, RawJob};
use serde::Serialize;
use serde_json::Value;

use super::duration::{format_timestamp, NOT_AVAILABLE};
use crate::diagnostics::Diagnostics;

/// Report-ready view of a job definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetails {
    pub job_id: Option<i64>,
    pub name: String,
    pub creator_user_name: String,
    pub created_time_utc: String,
    pub schedule_cron: String,
    pub schedule_timezone: String,
    pub tasks_summary: Vec<String>,
    pub default_cluster_info: String,
    /// Library specs, passed through untouched.
    pub libraries: Vec<Value>,
    pub max_concurrent_runs: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub retry_on_timeout: bool,
    pub notification_summary: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct JobDefinitionProcessor {
    diagnostics: Box<dyn Diagnostics>,
}

impl JobDefinitionProcessor {
    pub fn new(diagnostics: Box<dyn Diagnostics>) -> Self {
        Self { diagnostics }
    }

    pub fn process(&self, job: Option<&RawJob>) -> Option<JobDetails> {
        let Some(job) = job else {
            self.diagnostics.warn("No job definition provided to process");
            return None;
        };
        let settings = &job.settings;
        let schedule = settings.schedule.as_ref();

        let details = JobDetails {
            job_id: job.job_id,
            name: text(settings.name.as_deref()),
            creator_user_name: text(job.creator_user_name.as_deref()),
            created_time_utc: format_timestamp(job.created_time, true),
            schedule_cron: schedule
                .and_then(|s| s.quartz_cron_expression.clone())
                .unwrap_or_else(|| "Not Scheduled".to_string()),
            schedule_timezone: text(schedule.and_then(|s| s.timezone_id.as_deref())),
            tasks_summary: tasks_summary(&settings.tasks),
            default_cluster_info: cluster_summary(settings),
            libraries: settings.libraries.clone(),
            max_concurrent_runs: settings.max_concurrent_runs,
            timeout_seconds: settings.timeout_seconds,
            retry_on_timeout: settings.retry_on_timeout.unwrap_or(false),
            notification_summary: notification_summary(&settings.email_notifications),
            tags: settings.tags.clone(),
        };

        self.diagnostics.info(&format!(
            "Processed details for job {}",
            job.job_id.map_or_else(|| NOT_AVAILABLE.to_string(), |id| id.to_string())
        ));
        Some(details)
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn tasks_summary(tasks: &[JobTask]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["No tasks defined".to_string()];
    }

    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let key = task
                .task_key
                .clone()
                .unwrap_or_else(|| format!("Task_{}", i + 1));
            let mut desc = format!("Key: {}", key);
            if let Some(notebook) = &task.notebook_task {
                desc.push_str(&format!(", Notebook: {}", text(notebook.notebook_path.as_deref())));
            } else if let Some(jar) = &task.spark_jar_task {
                desc.push_str(&format!(
                    ", JAR Main Class: {}",
                    text(jar.main_class_name.as_deref())
                ));
            }
            desc
        })
        .collect()
}

fn cluster_summary(settings: &JobSettings) -> String {
    if let Some(cluster) = &settings.new_cluster {
        let workers = match (&cluster.autoscale, cluster.num_workers) {
            (Some(autoscale), _) => format!(
                "Autoscale {}-{}",
                autoscale.min_workers.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string()),
                autoscale.max_workers.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string())
            ),
            (None, Some(n)) => n.to_string(),
            (None, None) => NOT_AVAILABLE.to_string(),
        };
        return format!(
            "New Job Cluster: {}, {}, Workers: {}",
            text(cluster.spark_version.as_deref()),
            text(cluster.node_type_id.as_deref()),
            workers
        );
    }

    match settings.existing_cluster_id.as_deref() {
        Some(id) if !id.is_empty() => format!("Existing Cluster ID: {}", id),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn notification_summary(notifications: &EmailNotifications) -> Vec<String> {
    let groups = [
        ("On Start", &notifications.on_start),
        ("On Success", &notifications.on_success),
        ("On Failure", &notifications.on_failure),
    ];

    let summary: Vec<String> = groups
        .iter()
        .filter(|(_, addresses)| !addresses.is_empty())
        .map(|(label, addresses)| format!("{}: {}", label, addresses.join(", ")))
        .collect();

    if summary.is_empty() {
        vec!["None configured".to_string()]
    } else {
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use serde_json::json;

    fn processor() -> JobDefinitionProcessor {
        JobDefinitionProcessor::new(CollectingDiagnostics::new().handle())
    }

    #[test]
    fn test_none_input() {
        assert!(processor().process(None).is_none());
    }

    #[test]
    fn test_full_definition() {
        let job: RawJob = serde_json::from_value(json!({
            "job_id": 123,
            "creator_user_name": "test@example.com",
            "created_time": 0,
            "settings": {
                "name": "Nightly ETL",
                "tags": {"department": "finance"},
                "schedule": {"quartz_cron_expression": "0 0 5 * * ?", "timezone_id": "America/New_York"},
                "tasks": [
                    {"task_key": "ingest", "notebook_task": {"notebook_path": "/Users/test/Ingest"}},
                    {"spark_jar_task": {"main_class_name": "com.example.Main"}}
                ],
                "new_cluster": {"spark_version": "10.4.x-scala2.12", "node_type_id": "i3.xlarge", "num_workers": 5},
                "libraries": [{"jar": "dbfs:/path/to/my.jar"}],
                "max_concurrent_runs": 3,
                "timeout_seconds": 7200,
                "retry_on_timeout": true,
                "email_notifications": {"on_failure": ["admin@example.com"], "on_success": ["a@x.com", "b@x.com"]}
            }
        }))
        .unwrap();

        let details = processor().process(Some(&job)).unwrap();
        assert_eq!(details.job_id, Some(123));
        assert_eq!(details.name, "Nightly ETL");
        assert_eq!(details.created_time_utc, "1970-01-01 00:00:00 UTC");
        assert_eq!(details.schedule_cron, "0 0 5 * * ?");
        assert_eq!(details.schedule_timezone, "America/New_York");
        assert_eq!(
            details.tasks_summary,
            vec![
                "Key: ingest, Notebook: /Users/test/Ingest",
                "Key: Task_2, JAR Main Class: com.example.Main"
            ]
        );
        assert_eq!(
            details.default_cluster_info,
            "New Job Cluster: 10.4.x-scala2.12, i3.xlarge, Workers: 5"
        );
        assert_eq!(details.libraries.len(), 1);
        assert_eq!(details.max_concurrent_runs, Some(3));
        assert!(details.retry_on_timeout);
        assert_eq!(
            details.notification_summary,
            vec!["On Success: a@x.com, b@x.com", "On Failure: admin@example.com"]
        );
        assert_eq!(details.tags["department"], "finance");
    }

    #[test]
    fn test_minimal_definition_defaults() {
        let job: RawJob = serde_json::from_value(json!({"job_id": 1})).unwrap();
        let details = processor().process(Some(&job)).unwrap();

        assert_eq!(details.name, "N/A");
        assert_eq!(details.creator_user_name, "N/A");
        assert_eq!(details.created_time_utc, "N/A");
        assert_eq!(details.schedule_cron, "Not Scheduled");
        assert_eq!(details.tasks_summary, vec!["No tasks defined"]);
        assert_eq!(details.default_cluster_info, "N/A");
        assert_eq!(details.notification_summary, vec!["None configured"]);
        assert!(!details.retry_on_timeout);
        assert!(details.max_concurrent_runs.is_none());
    }

    #[test]
    fn test_cluster_variants() {
        let autoscale: RawJob = serde_json::from_value(json!({
            "settings": {"new_cluster": {"spark_version": "13.3", "node_type_id": "m5", "autoscale": {"min_workers": 1, "max_workers": 4}}}
        }))
        .unwrap();
        assert_eq!(
            processor().process(Some(&autoscale)).unwrap().default_cluster_info,
            "New Job Cluster: 13.3, m5, Workers: Autoscale 1-4"
        );

        let existing: RawJob = serde_json::from_value(json!({
            "settings": {"existing_cluster_id": "0101-abc"}
        }))
        .unwrap();
        assert_eq!(
            processor().process(Some(&existing)).unwrap().default_cluster_info,
            "Existing Cluster ID: 0101-abc"
        );
    }
}
