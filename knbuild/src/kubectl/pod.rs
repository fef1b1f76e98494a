use std::fmt::{self, Write};

use serde::Deserialize;

/// [Pod](https://kubernetes.io/docs/reference/kubernetes-api/workload-resources/pod-v1/)
#[derive(Debug, Deserialize)]
pub struct Pod {
    pub status: PodStatus,
}

/// Partially implements [PodStatus](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#podstatus-v1-core)
#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    #[serde(default)]
    pub conditions: Vec<PodCondition>,

    /// Tekton runs its own setup (entrypoint placement, scripts) in init containers.
    #[serde(default)]
    pub init_container_statuses: Vec<ContainerStatus>,

    /// One entry per container in the manifest; every build step is a container.
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,

    #[serde(default)]
    pub message: Option<String>,

    /// A brief CamelCase message indicating details about why the pod is in this state. e.g. 'Evicted'.
    #[serde(default)]
    pub reason: Option<String>,

    pub phase: PodPhase,
}

impl PodStatus {
    pub fn is_unschedulable(&self) -> bool {
        self.conditions.iter().any(|condition| {
            condition.r#type == "PodScheduled"
                && condition.reason.as_deref() == Some("Unschedulable")
        })
    }

    fn all_container_statuses(&self) -> impl Iterator<Item = &ContainerStatus> {
        self.init_container_statuses
            .iter()
            .chain(self.container_statuses.iter())
    }

    /// Returns `Some(value)` where `value` indicates whether the logs are available if it can be determined from the
    /// current status, and `None` otherwise.
    pub fn are_logs_available(&self) -> Option<bool> {
        if self
            .all_container_statuses()
            .any(ContainerStatus::cannot_pull_image)
        {
            return Some(false);
        };

        match self.phase {
            PodPhase::Unknown => Some(false),
            PodPhase::Running | PodPhase::Succeeded | PodPhase::Failed => Some(true),
            PodPhase::Pending => None,
        }
    }

    pub fn display_multi_line(&self, indent: usize) -> PodStatusDisplayMultiLine {
        PodStatusDisplayMultiLine {
            status: self,
            indent,
        }
    }
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.phase.fmt(f)?;

        if let Some(message) = self.message.as_ref() {
            f.write_str(": ")?;
            f.write_str(message)?;
        }

        Ok(())
    }
}

pub struct PodStatusDisplayMultiLine<'a> {
    status: &'a PodStatus,
    indent: usize,
}

impl fmt::Display for PodStatusDisplayMultiLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn do_indent(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
            for _ in 0..indent {
                f.write_str("  ")?;
            }
            Ok(())
        }

        let Self { status, indent } = *self;

        status.fmt(f)?;

        let conditions = status
            .conditions
            .iter()
            .filter(|condition| condition.status != "True")
            .collect::<Vec<_>>();

        if !conditions.is_empty() {
            f.write_char('\n')?;
            do_indent(f, indent)?;
            f.write_str("Conditions:")?;
        }

        for condition in conditions {
            f.write_char('\n')?;
            do_indent(f, indent + 1)?;
            write!(f, "{}: {}", &condition.r#type, &condition.status)?;
            if let Some(reason) = condition.reason.as_deref() {
                write!(f, ", reason: {reason}")?;
            }
            if let Some(message) = condition.message.as_deref() {
                write!(f, ", message: {message}")?;
            }
        }

        if !status.container_statuses.is_empty() || !status.init_container_statuses.is_empty() {
            f.write_char('\n')?;
            do_indent(f, indent)?;
            f.write_str("Container Statuses:")?;
        }

        for status in status.all_container_statuses() {
            f.write_char('\n')?;
            do_indent(f, indent + 1)?;
            write!(
                f,
                "container {name:?} using image {image:?} is {state}",
                name = status.name,
                image = status.image,
                state = status.state.state_name(),
            )?;
            if let Some(reason) = status.state.reason() {
                write!(f, " because {reason}")?;
            }
            if let Some(message) = status.state.message() {
                write!(f, ": {message}")?;
            }
        }
        Ok(())
    }
}

/// Partially implements [PodCondition](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#podcondition-v1-core)
#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodCondition {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub reason: Option<String>,

    /// Can be True, False, Unknown.
    pub status: String,

    pub r#type: String,
}

/// Partially implements [ContainerStatus](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#containerstatus-v1-core)
#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    pub name: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub state: Option<ContainerState>,
}

impl ContainerStatus {
    pub fn cannot_pull_image(&self) -> bool {
        let Some(ContainerState::Waiting(state)) = &self.state else {
            return false;
        };
        matches!(
            state.reason.as_deref(),
            Some("ErrImagePull" | "ImagePullBackOff" | "InvalidImageName")
        )
    }
}

#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ContainerState {
    Waiting(ContainerStateDetails),
    Running(ContainerStateRunning),
    Terminated(ContainerStateDetails),
}

/// [ContainerStateRunning](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#containerstaterunning-v1-core),
/// none of its fields are of interest.
#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct ContainerStateRunning {}

/// The `reason` and `message` fields shared by
/// [ContainerStateWaiting](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#containerstatewaiting-v1-core)
/// and [ContainerStateTerminated](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#containerstateterminated-v1-core).
#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStateDetails {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub reason: Option<String>,
}

trait ContainerStateExt {
    fn state_name(&self) -> &'static str;
    fn message(&self) -> Option<&str>;
    fn reason(&self) -> Option<&str>;
}

impl ContainerStateExt for Option<ContainerState> {
    fn state_name(&self) -> &'static str {
        match self {
            Some(ContainerState::Waiting(_)) => "waiting",
            Some(ContainerState::Running(_)) => "running",
            Some(ContainerState::Terminated(_)) => "terminated",
            None => "unknown",
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Some(ContainerState::Waiting(state) | ContainerState::Terminated(state)) => {
                state.message.as_deref()
            }
            _ => None,
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            Some(ContainerState::Waiting(state) | ContainerState::Terminated(state)) => {
                state.reason.as_deref()
            }
            _ => None,
        }
    }
}

/// Field `phase` of [PodStatus](https://kubernetes.io/docs/reference/generated/kubernetes-api/v1.31/#podstatus-v1-core).
#[derive(Debug, Deserialize, Eq, PartialEq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_pod_with_pull_error_has_no_logs() {
        let status: PodStatus = serde_json::from_str(
            r#"{
                "phase": "Pending",
                "initContainerStatuses": [
                    { "name": "prepare", "image": "tekton/entrypoint", "state": { "terminated": { "reason": "Completed", "exitCode": 0 } } }
                ],
                "containerStatuses": [
                    {
                        "name": "step-extract-bundle",
                        "image": "reg.io/app_source:v1",
                        "imageID": "",
                        "state": { "waiting": { "reason": "ImagePullBackOff", "message": "Back-off pulling image" } }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(status.are_logs_available(), Some(false));
        let text = status.display_multi_line(0).to_string();
        assert!(text.contains("container \"step-extract-bundle\" using image \"reg.io/app_source:v1\" is waiting because ImagePullBackOff: Back-off pulling image"));
    }

    #[test]
    fn logs_become_available_once_running() {
        let status: PodStatus = serde_json::from_str(
            r#"{ "phase": "Pending", "containerStatuses": [
                { "name": "step-build-and-push", "image": "kaniko", "state": { "waiting": { "reason": "PodInitializing" } } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(status.are_logs_available(), None);

        let status: PodStatus = serde_json::from_str(
            r#"{ "phase": "Running", "containerStatuses": [
                { "name": "step-build-and-push", "image": "kaniko", "state": { "running": { "startedAt": "2024-10-16T10:00:00Z" } } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(status.are_logs_available(), Some(true));
    }

    #[test]
    fn unschedulable_pods_are_detected() {
        let status: PodStatus = serde_json::from_str(
            r#"{ "phase": "Pending", "conditions": [
                { "type": "PodScheduled", "status": "False", "reason": "Unschedulable", "message": "0/3 nodes are available" }
            ] }"#,
        )
        .unwrap();
        assert!(status.is_unschedulable());
        assert_eq!(status.are_logs_available(), None);
    }
}
