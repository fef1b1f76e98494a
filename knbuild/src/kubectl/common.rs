use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GetResource<T> {
    #[serde(rename = "items")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// https://github.com/kubernetes/community/blob/master/contributors/devel/sig-architecture/api-conventions.md#metadata
pub struct ResourceMetadata {
    pub name: String,

    #[serde(with = "time::serde::rfc3339")]
    pub creation_timestamp: time::OffsetDateTime,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// The `knative.dev/pkg/apis` condition shape shared by Shipwright and Tekton resources.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,

    /// One of `True`, `False` or `Unknown`.
    pub status: String,

    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// The outcome of a run according to its `Succeeded` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<'a> {
    Running,
    Succeeded,
    Failed(&'a Condition),
}

impl<'a> Completion<'a> {
    pub fn from_conditions(conditions: &'a [Condition]) -> Self {
        match conditions
            .iter()
            .find(|condition| condition.r#type == "Succeeded")
        {
            Some(condition) if condition.status == "True" => Completion::Succeeded,
            Some(condition) if condition.status == "False" => Completion::Failed(condition),
            _ => Completion::Running,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason.as_deref().unwrap_or(&self.status))?;
        if let Some(message) = self.message.as_deref() {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(status: &str) -> Condition {
        Condition {
            r#type: "Succeeded".to_owned(),
            status: status.to_owned(),
            reason: Some("Reason".to_owned()),
            message: Some("details".to_owned()),
        }
    }

    #[test]
    fn completion_follows_the_succeeded_condition() {
        assert_eq!(Completion::from_conditions(&[]), Completion::Running);
        assert_eq!(
            Completion::from_conditions(&[condition("Unknown")]),
            Completion::Running
        );
        assert_eq!(
            Completion::from_conditions(&[condition("True")]),
            Completion::Succeeded
        );
        let failed = [condition("False")];
        assert_eq!(
            Completion::from_conditions(&failed),
            Completion::Failed(&failed[0])
        );
        assert_eq!(failed[0].to_string(), "Reason: details");
    }
}
