//! Run records and raw run descriptions from the jobs API.

use serde::{Deserialize, Serialize};

/// A completed run, the unit of history analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunRecord {
    /// Missing ids are tolerated; such runs still count toward the statistics.
    #[serde(default)]
    pub run_id: Option<i64>,

    /// Epoch milliseconds.
    #[serde(default)]
    pub start_time: Option<i64>,

    /// Milliseconds spent executing.
    #[serde(default)]
    pub execution_duration: Option<i64>,

    /// Terminal result state, e.g. `"SUCCESS"`, `"FAILED"`, `"CANCELED"`.
    #[serde(default)]
    pub result_state: Option<String>,
}

impl RunRecord {
    /// Create a record with all fields present.
    pub fn new(run_id: i64, start_time: i64, execution_duration: i64, result_state: &str) -> Self {
        Self {
            run_id: Some(run_id),
            start_time: Some(start_time),
            execution_duration: Some(execution_duration),
            result_state: Some(result_state.to_string()),
        }
    }
}

/// Run state as reported by the API.
///
/// The runs API nests life-cycle and result state in an object, while
/// pre-flattened records carry the life-cycle state as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunState {
    Detailed(RunStateDetail),
    LifeCycle(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStateDetail {
    #[serde(default)]
    pub life_cycle_state: Option<String>,

    #[serde(default)]
    pub result_state: Option<String>,

    #[serde(default)]
    pub state_message: Option<String>,
}

/// One run as returned by `jobs/runs/get` or listed by `jobs/runs/list`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRun {
    #[serde(default)]
    pub run_id: Option<i64>,

    #[serde(default)]
    pub job_id: Option<i64>,

    #[serde(default)]
    pub run_name: Option<String>,

    #[serde(default)]
    pub notebook_path: Option<String>,

    #[serde(default)]
    pub state: Option<RunState>,

    /// Flat result state, present on pre-flattened records.
    #[serde(default)]
    pub result_state: Option<String>,

    #[serde(default, alias = "start_time_ms")]
    pub start_time: Option<i64>,

    #[serde(default, alias = "end_time_ms")]
    pub end_time: Option<i64>,

    #[serde(default, alias = "duration_ms")]
    pub execution_duration: Option<i64>,

    #[serde(default)]
    pub run_page_url: Option<String>,

    #[serde(default)]
    pub cluster_spec: Option<ClusterSpec>,
}

impl RawRun {
    pub fn life_cycle_state(&self) -> Option<&str> {
        match self.state.as_ref()? {
            RunState::Detailed(detail) => detail.life_cycle_state.as_deref(),
            RunState::LifeCycle(state) => Some(state),
        }
    }

    /// The flat result state if present, otherwise the nested one.
    pub fn result_state(&self) -> Option<&str> {
        if let Some(state) = self.result_state.as_deref() {
            return Some(state);
        }
        match self.state.as_ref()? {
            RunState::Detailed(detail) => detail.result_state.as_deref(),
            RunState::LifeCycle(_) => None,
        }
    }
}

/// One page of `jobs/runs/list`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunListPage {
    #[serde(default)]
    pub runs: Vec<RawRun>,

    #[serde(default)]
    pub has_more: bool,
}

/// Cluster specification attached to a run.
///
/// Either references a pre-provisioned cluster, nests a `new_cluster`
/// definition, or carries the new cluster's fields inline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    #[serde(default)]
    pub existing_cluster_id: Option<String>,

    #[serde(default)]
    pub new_cluster: Option<NewCluster>,

    #[serde(default)]
    pub num_workers: Option<u32>,

    #[serde(default)]
    pub autoscale: Option<Autoscale>,

    #[serde(default)]
    pub node_type_id: Option<String>,

    #[serde(default)]
    pub driver_node_type_id: Option<String>,

    #[serde(default)]
    pub spark_version: Option<String>,
}

impl ClusterSpec {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Definition of a job cluster created for the run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewCluster {
    #[serde(default)]
    pub num_workers: Option<u32>,

    #[serde(default)]
    pub autoscale: Option<Autoscale>,

    #[serde(default)]
    pub node_type_id: Option<String>,

    #[serde(default)]
    pub driver_node_type_id: Option<String>,

    #[serde(default)]
    pub spark_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Autoscale {
    #[serde(default)]
    pub min_workers: Option<u32>,

    #[serde(default)]
    pub max_workers: Option<u32>,
}

/// Output of a run from `jobs/runs/get-output`, fetched for failed runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRunOutput {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub error_trace: Option<String>,

    #[serde(default)]
    pub notebook_output: Option<NotebookOutput>,

    #[serde(default)]
    pub logs_truncated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotebookOutput {
    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub truncated: Option<bool>,
}
