mod shipwright;
mod tekton;

pub(crate) mod common;

use std::time::Duration;

pub use common::*;
pub use shipwright::*;
pub use tekton::*;

use crate::{assemble::BuildRequest, kubectl::Kubectl, strategy::BuildStrategyTemplate, Error};

pub struct SubmitArgs<'a> {
    pub kubectl: &'a Kubectl<'a>,
    pub request: &'a BuildRequest<'a>,
    pub template: &'a BuildStrategyTemplate,
    /// How long the build may take from submission until it completes.
    pub timeout: Duration,
}

pub struct SubmitOutput {
    /// Digest of the published image, when the strategy reports one.
    pub digest: Option<String>,
}

/// Runs a build on the cluster and waits for it to complete.
pub trait Backend {
    fn submit(&self, args: SubmitArgs) -> Result<SubmitOutput, Error>;
}
