use serde::Deserialize;

use super::{Completion, Condition};

/// The parts of a [Tekton TaskRun](https://tekton.dev/docs/pipelines/taskruns/) that are read
/// back while waiting for a build.
#[derive(Debug, Deserialize)]
pub struct TaskRun {
    #[serde(default)]
    pub status: TaskRunStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub pod_name: Option<String>,

    /// Results as reported by `tekton.dev/v1beta1`.
    #[serde(default)]
    pub task_results: Vec<TaskRunResult>,

    /// Results as reported by `tekton.dev/v1`.
    #[serde(default)]
    pub results: Vec<TaskRunResult>,
}

impl TaskRunStatus {
    pub fn pod_name(&self) -> Option<&str> {
        self.pod_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn completion(&self) -> Completion<'_> {
        Completion::from_conditions(&self.conditions)
    }

    /// Returns the trimmed value of the string result called `name`.
    pub fn result(&self, name: &str) -> Option<&str> {
        self.task_results
            .iter()
            .chain(self.results.iter())
            .find(|result| result.name == name)
            .and_then(|result| result.value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskRunResult {
    pub name: String,
    /// A string for string results, arrays and objects are not used here.
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_run_results_are_read_from_either_api_version() {
        let v1beta1: TaskRun = serde_json::from_str(
            r#"{ "status": {
                "podName": "app-abcde-pod",
                "conditions": [ { "type": "Succeeded", "status": "True" } ],
                "taskResults": [ { "name": "mink-image-digest", "type": "string", "value": "sha256:feed\n" } ]
            } }"#,
        )
        .unwrap();
        assert_eq!(v1beta1.status.pod_name(), Some("app-abcde-pod"));
        assert_eq!(v1beta1.status.completion(), Completion::Succeeded);
        assert_eq!(
            v1beta1.status.result("mink-image-digest"),
            Some("sha256:feed")
        );

        let v1: TaskRun = serde_json::from_str(
            r#"{ "status": {
                "podName": "",
                "results": [ { "name": "mink-image-digest", "value": "sha256:beef" } ]
            } }"#,
        )
        .unwrap();
        assert_eq!(v1.status.pod_name(), None);
        assert_eq!(v1.status.result("mink-image-digest"), Some("sha256:beef"));
        assert_eq!(v1.status.result("other"), None);
    }
}
