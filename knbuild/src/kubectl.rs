use std::path::Path;

use log::{debug, error};

use crate::{process, Result};

mod build_run;
pub use build_run::*;

mod common;
pub use common::*;

mod name;
pub use name::*;

mod pod;
pub use pod::*;

mod task_run;
pub use task_run::*;

/// Namespace used when neither `--namespace` nor the kubeconfig context names one.
pub const DEFAULT_NAMESPACE: &str = "default";

pub struct Kubectl<'a> {
    kubeconfig: Option<&'a Path>,
    context: Option<&'a str>,
}

impl<'a> Kubectl<'a> {
    pub fn new(kubeconfig: Option<&'a Path>, context: Option<&'a str>) -> Self {
        Self {
            kubeconfig,
            context,
        }
    }

    /// Returns the kubectl command where the connection arguments have already been set.
    fn kubectl(&self) -> process::Command {
        let mut command = process::command!("kubectl");
        if let Some(kubeconfig) = self.kubeconfig {
            command = process::args!(command, "--kubeconfig", kubeconfig);
        }
        if let Some(context) = self.context {
            command = process::args!(command, "--context", context);
        }
        command
    }

    /// Returns the namespace of the selected kubeconfig context, if it has one.
    pub fn current_namespace(&self) -> Result<Option<String>> {
        let output = process::args!(
            self.kubectl(),
            "config",
            "view",
            "--minify",
            "--output=jsonpath={..namespace}"
        )
        .output()?;

        let namespace = std::str::from_utf8(&output.stdout)?.trim();
        Ok((!namespace.is_empty()).then(|| namespace.to_owned()))
    }

    /// The object is written to stdin as a [JSON formatted kubernetes
    /// configuration](https://kubernetes.io/docs/tasks/manage-kubernetes-objects/imperative-config/).
    pub fn create<T: serde::Serialize>(&self, object: &T) -> Result<ResourceHandle> {
        self.write("create", &serde_json::to_string(object)?)
    }

    /// Creates the object or updates it to match the input. See
    /// [declarative management](https://kubernetes.io/docs/tasks/manage-kubernetes-objects/declarative-config/).
    pub fn apply<T: serde::Serialize>(&self, object: &T) -> Result<ResourceHandle> {
        self.write("apply", &serde_json::to_string(object)?)
    }

    fn write(&self, verb: &str, input: &str) -> Result<ResourceHandle> {
        let output = process::args!(self.kubectl(), verb, "--output=json", "-f", "-")
            .try_output_with_input(input.as_bytes().to_owned())?;

        if log::log_enabled!(log::Level::Error) && !output.status.success() {
            let path = crate::temp_path::tmp_json_path();
            if std::fs::write(&path, input).is_ok() {
                error!("Rejected object written to {}", path.display());
            }
        }

        let output = output.require_success()?;

        let created: CreateOutput = serde_json::from_slice(&output.stdout)?;
        let handle = ResourceHandle::from(created);
        debug!("{verb} {handle}");
        Ok(handle)
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        namespace: &str,
        name: &str,
    ) -> Result<T> {
        let output = process::args!(
            self.kubectl(),
            "get",
            resource,
            "--namespace",
            namespace,
            name,
            "--output=json",
        )
        .output()?;

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    pub fn pod(&self, namespace: &str, pod_name: &str) -> Result<Pod> {
        self.get("pod", namespace, pod_name)
    }

    pub fn build_run(&self, namespace: &str, name: &str) -> Result<BuildRun> {
        self.get("buildruns.shipwright.io", namespace, name)
    }

    pub fn task_run(&self, namespace: &str, name: &str) -> Result<TaskRun> {
        self.get("taskruns.tekton.dev", namespace, name)
    }

    pub fn build_runs(&self, namespace: &str) -> Result<Vec<BuildRun>> {
        let output = process::args!(
            self.kubectl(),
            "get",
            "buildruns.shipwright.io",
            "--namespace",
            namespace,
            "--output=json"
        )
        .output()?;

        Ok(serde_json::from_slice::<GetResource<_>>(&output.stdout)?.items)
    }

    /// Streams the logs of every container of the pod, in order, to our standard error.
    pub fn follow_pod_logs(&self, namespace: &str, pod_name: &str) -> Result<()> {
        process::args!(
            self.kubectl(),
            "logs",
            "--namespace",
            namespace,
            "--follow",
            "--all-containers",
            "--prefix",
            pod_name
        )
        .stdout_to_stderr()
        .status()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub kind: String,
    /// Absent for cluster scoped resources.
    pub namespace: Option<String>,
    pub name: String,
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} {namespace}/{}", self.kind, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

impl From<CreateOutput> for ResourceHandle {
    fn from(value: CreateOutput) -> Self {
        let CreateOutput {
            kind,
            metadata: CreateOutputMetadata { namespace, name },
        } = value;
        Self {
            kind,
            namespace,
            name,
        }
    }
}

#[derive(serde::Deserialize)]
struct CreateOutput {
    kind: String,
    metadata: CreateOutputMetadata,
}

#[derive(serde::Deserialize)]
struct CreateOutputMetadata {
    #[serde(default)]
    namespace: Option<String>,
    name: String,
}

pub mod annotation {
    pub const SUBMITTED_BY: &str = "knbuild.dev/submitted-by";
    pub const SOURCE_IMAGE: &str = "knbuild.dev/source-image";
    pub const VERSION: &str = "knbuild.dev/version";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_handle_from_create_output() {
        let output: CreateOutput = serde_json::from_str(
            r#"{
                "apiVersion": "shipwright.io/v1alpha1",
                "kind": "BuildRun",
                "metadata": { "name": "app-x7k2p", "namespace": "builds", "uid": "1234" }
            }"#,
        )
        .unwrap();
        let handle = ResourceHandle::from(output);
        assert_eq!(handle.to_string(), "BuildRun builds/app-x7k2p");

        let output: CreateOutput = serde_json::from_str(
            r#"{ "kind": "ClusterBuildStrategy", "metadata": { "name": "kaniko-local" } }"#,
        )
        .unwrap();
        let handle = ResourceHandle::from(output);
        assert_eq!(handle.namespace, None);
        assert_eq!(handle.to_string(), "ClusterBuildStrategy kaniko-local");
    }
}
