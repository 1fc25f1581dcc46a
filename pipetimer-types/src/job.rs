//! Job definitions as returned by `jobs/get`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::NewCluster;

/// A scheduled job definition (not to be confused with a Spark job inside
/// an event log).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawJob {
    #[serde(default)]
    pub job_id: Option<i64>,

    #[serde(default)]
    pub creator_user_name: Option<String>,

    /// Epoch milliseconds.
    #[serde(default)]
    pub created_time: Option<i64>,

    #[serde(default)]
    pub settings: JobSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub schedule: Option<JobSchedule>,

    #[serde(default)]
    pub tasks: Vec<JobTask>,

    #[serde(default)]
    pub new_cluster: Option<NewCluster>,

    #[serde(default)]
    pub existing_cluster_id: Option<String>,

    #[serde(default)]
    pub email_notifications: EmailNotifications,

    /// Library specs are passed through untouched.
    #[serde(default)]
    pub libraries: Vec<Value>,

    #[serde(default)]
    pub max_concurrent_runs: Option<u32>,

    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    #[serde(default)]
    pub retry_on_timeout: Option<bool>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSchedule {
    #[serde(default)]
    pub quartz_cron_expression: Option<String>,

    #[serde(default)]
    pub timezone_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobTask {
    #[serde(default)]
    pub task_key: Option<String>,

    #[serde(default)]
    pub notebook_task: Option<NotebookTask>,

    #[serde(default)]
    pub spark_jar_task: Option<SparkJarTask>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotebookTask {
    #[serde(default)]
    pub notebook_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparkJarTask {
    #[serde(default)]
    pub main_class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailNotifications {
    #[serde(default)]
    pub on_start: Vec<String>,

    #[serde(default)]
    pub on_success: Vec<String>,

    #[serde(default)]
    pub on_failure: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_job_definition() {
        let json = r#"{
            "job_id": 123,
            "creator_user_name": "test@example.com",
            "settings": {
                "name": "Nightly ETL",
                "schedule": {"quartz_cron_expression": "0 0 5 * * ?", "timezone_id": "UTC"},
                "tasks": [{"task_key": "ingest", "notebook_task": {"notebook_path": "/Repos/etl/ingest"}}],
                "new_cluster": {"spark_version": "13.3.x-scala2.12", "node_type_id": "i3.xlarge", "num_workers": 4},
                "libraries": [{"jar": "dbfs:/libs/etl.jar"}],
                "tags": {"team": "data"}
            }
        }"#;
        let job: RawJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.job_id, Some(123));
        assert_eq!(job.settings.tasks.len(), 1);
        assert_eq!(job.settings.libraries.len(), 1);
        assert_eq!(job.settings.new_cluster.unwrap().num_workers, Some(4));
        assert!(job.settings.email_notifications.on_failure.is_empty());
        assert_eq!(job.settings.tags.get("team").map(String::as_str), Some("data"));
    }

    #[test]
    fn test_missing_settings_defaults() {
        let job: RawJob = serde_json::from_str(r#"{"job_id": 1}"#).unwrap();
        assert!(job.settings.name.is_none());
        assert!(job.settings.tasks.is_empty());
    }
}
