//! [Tekton](https://tekton.dev/docs/pipelines/) `tekton.dev/v1beta1` resources.

use ::kubernetes::models as k8s;
use serde::{Deserialize, Serialize};

use super::LocalObjectReference;

pub const API_VERSION: &str = "tekton.dev/v1beta1";
pub const TASK_RUN_KIND: &str = "TaskRun";

/// Name of the parameter that passes the fully-qualified reference of a container image that,
/// when run, unpacks its payload into the working directory in which it was invoked.
pub const SOURCE_BUNDLE_PARAM: &str = "mink-source-bundle";

/// Name of the parameter that passes the fully-qualified reference to publish the image to.
pub const IMAGE_TARGET_PARAM: &str = "mink-image-target";

/// Name of the result that surfaces the digest of the published image. The digest is not fully
/// qualified, it has the form `sha256:deadbeef`.
pub const IMAGE_DIGEST_RESULT: &str = "mink-image-digest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    pub api_version: String,
    pub kind: String,
    pub metadata: k8s::V1ObjectMeta,
    pub spec: TaskRunSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    pub params: Vec<Param>,
    pub task_spec: TaskSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub params: Vec<ParamSpec>,
    pub results: Vec<TaskResult>,
    pub steps: Vec<k8s::V1Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<k8s::V1Volume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_service_links: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
}
