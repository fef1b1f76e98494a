//! The catalog of build strategies this tool knows how to run.
//!
//! Every strategy is a Shipwright strategy document embedded in the binary. The catalog parses
//! them once and hands out read-only [`BuildStrategyTemplate`]s.

mod buildpack;
mod kaniko;

use std::{fmt, str::FromStr};

use ::kubernetes::models as k8s;

pub use buildpack::Buildpack;
pub use kaniko::Kaniko;

use crate::resources::shipwright;

/// Name of the strategy parameter that receives the source image reference.
pub const SOURCE_IMAGE_PARAM: &str = "source-image";

/// How steps refer to the value of [`SOURCE_IMAGE_PARAM`].
pub const SOURCE_IMAGE_PLACEHOLDER: &str = "$(params.source-image)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyName {
    Kaniko,
    Buildpack,
}

impl StrategyName {
    pub const ALL: [StrategyName; 2] = [StrategyName::Kaniko, StrategyName::Buildpack];

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyName::Kaniko => "kaniko",
            StrategyName::Buildpack => "buildpack",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyName {
    type Err = UnsupportedStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnsupportedStrategy(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported strategy {0:?}, only 'kaniko' and 'buildpack' are supported")]
pub struct UnsupportedStrategy(pub String);

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("the embedded {0} strategy is not a valid strategy document: {1}")]
    Parse(StrategyName, #[source] serde_yaml::Error),

    #[error("the embedded {0} strategy does not have a name")]
    MissingName(StrategyName),

    #[error("the embedded {0} strategy does not define any build steps")]
    NoSteps(StrategyName),

    #[error("the embedded {0} strategy does not declare the \"source-image\" parameter")]
    MissingSourceParameter(StrategyName),
}

/// A build strategy with its step list defined by an embedded document.
pub trait Strategy {
    fn name(&self) -> StrategyName;

    /// The Shipwright strategy document describing the steps.
    fn document(&self) -> &'static str;

    fn template(&self) -> Result<BuildStrategyTemplate, TemplateError> {
        BuildStrategyTemplate::parse(self.name(), self.document())
    }
}

/// The ordered build steps of a strategy and the name under which the strategy object is
/// created on the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStrategyTemplate {
    name: StrategyName,
    object_name: String,
    parameters: Vec<shipwright::Parameter>,
    steps: Vec<k8s::V1Container>,
}

impl BuildStrategyTemplate {
    fn parse(name: StrategyName, document: &str) -> Result<Self, TemplateError> {
        let strategy: shipwright::BuildStrategy =
            serde_yaml::from_str(document).map_err(|error| TemplateError::Parse(name, error))?;

        let object_name = strategy
            .metadata
            .name
            .filter(|name| !name.is_empty())
            .ok_or(TemplateError::MissingName(name))?;

        let shipwright::BuildStrategySpec {
            parameters,
            build_steps: steps,
        } = strategy.spec;

        if steps.is_empty() {
            return Err(TemplateError::NoSteps(name));
        }

        if !parameters
            .iter()
            .any(|parameter| parameter.name == SOURCE_IMAGE_PARAM)
        {
            return Err(TemplateError::MissingSourceParameter(name));
        }

        Ok(Self {
            name,
            object_name,
            parameters,
            steps,
        })
    }

    pub fn name(&self) -> StrategyName {
        self.name
    }

    /// Name of the strategy object, e.g. `kaniko-local`.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn parameters(&self) -> &[shipwright::Parameter] {
        &self.parameters
    }

    pub fn steps(&self) -> &[k8s::V1Container] {
        &self.steps
    }
}

/// All strategy templates, parsed once at start-up.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    kaniko: BuildStrategyTemplate,
    buildpack: BuildStrategyTemplate,
}

impl StrategyCatalog {
    pub fn load() -> Result<Self, TemplateError> {
        Ok(Self {
            kaniko: Kaniko.template()?,
            buildpack: Buildpack.template()?,
        })
    }

    pub fn lookup(&self, name: StrategyName) -> &BuildStrategyTemplate {
        match name {
            StrategyName::Kaniko => &self.kaniko,
            StrategyName::Buildpack => &self.buildpack,
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&BuildStrategyTemplate, UnsupportedStrategy> {
        Ok(self.lookup(name.parse()?))
    }
}
