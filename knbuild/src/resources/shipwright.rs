//! [Shipwright](https://shipwright.io/docs/) `shipwright.io/v1alpha1` resources.

use ::kubernetes::models as k8s;
use serde::{Deserialize, Serialize};

use super::LocalObjectReference;

pub const API_VERSION: &str = "shipwright.io/v1alpha1";
pub const BUILD_KIND: &str = "Build";
pub const BUILD_RUN_KIND: &str = "BuildRun";

/// Parameters Shipwright provides to every strategy.
pub mod param {
    pub const OUTPUT_IMAGE: &str = "$(params.shp-output-image)";
    pub const SOURCE_ROOT: &str = "$(params.shp-source-root)";
    pub const IMAGE_DIGEST_RESULT_PATH: &str = "$(results.shp-image-digest.path)";
}

/// Where Shipwright mounts the build source inside every step.
pub const SOURCE_ROOT: &str = "/workspace/source";

/// Either a `BuildStrategy` or a `ClusterBuildStrategy`, both share the same schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategy {
    pub api_version: String,
    pub kind: String,
    pub metadata: k8s::V1ObjectMeta,
    pub spec: BuildStrategySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategySpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub build_steps: Vec<k8s::V1Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub api_version: String,
    pub kind: String,
    pub metadata: k8s::V1ObjectMeta,
    pub spec: BuildSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    pub source: GitSource,
    pub strategy: StrategyRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_values: Vec<ParamValue>,
    pub output: Image,
}

/// Shipwright requires a git source even when the strategy provides the source itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRef {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<LocalObjectReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRun {
    pub api_version: String,
    pub kind: String,
    pub metadata: k8s::V1ObjectMeta,
    pub spec: BuildRunSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRunSpec {
    pub build_ref: LocalObjectReference,
    pub service_account: ServiceAccount,
    /// Values that vary per run, such as the digest-pinned source bundle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_values: Vec<ParamValue>,
}

/// Either names an existing service account or asks Shipwright to generate one that carries the
/// output credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub generate: bool,
}
