use serde::Deserialize;

use super::{Completion, Condition, ResourceMetadata};

/// The parts of a [Shipwright BuildRun](https://github.com/shipwright-io/build/blob/v0.11.0/docs/buildrun.md)
/// that are read back while waiting for a build.
#[derive(Debug, Deserialize)]
pub struct BuildRun {
    pub metadata: ResourceMetadata,
    pub spec: BuildRunSpec,
    #[serde(default)]
    pub status: BuildRunStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRunSpec {
    #[serde(default)]
    pub build_ref: Option<BuildRef>,
}

#[derive(Debug, Deserialize)]
pub struct BuildRef {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRunStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Name of the TaskRun executing the build.
    #[serde(default)]
    pub latest_task_run_ref: Option<String>,

    /// Older Shipwright releases report the TaskRun under this name.
    #[serde(default)]
    pub task_run_name: Option<String>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<time::OffsetDateTime>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_time: Option<time::OffsetDateTime>,

    #[serde(default)]
    pub output: Option<BuildRunOutput>,

    #[serde(default)]
    pub failure_details: Option<FailureDetails>,
}

impl BuildRunStatus {
    pub fn task_run_name(&self) -> Option<&str> {
        self.latest_task_run_ref
            .as_deref()
            .or(self.task_run_name.as_deref())
    }

    pub fn completion(&self) -> Completion<'_> {
        Completion::from_conditions(&self.conditions)
    }

    /// Digest of the pushed image, if the strategy reported one.
    pub fn digest(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|output| output.digest.as_deref())
            .map(str::trim)
            .filter(|digest| !digest.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildRunOutput {
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FailureDetails {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Display for FailureDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.reason.as_deref(), self.message.as_deref()) {
            (Some(reason), Some(message)) => write!(f, "{reason}: {message}"),
            (Some(value), None) | (None, Some(value)) => f.write_str(value),
            (None, None) => f.write_str("unknown failure"),
        }
    }
}
