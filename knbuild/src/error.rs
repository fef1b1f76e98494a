use std::path::PathBuf;

use image_reference::InvalidImageReference;

use crate::{
    cancel,
    strategy::{TemplateError, UnsupportedStrategy},
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can make a build invocation fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(#[from] InvalidImageReference),

    #[error(transparent)]
    UnsupportedStrategy(#[from] UnsupportedStrategy),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to bundle {} into {image}: {source}", .directory.display())]
    Bundling {
        directory: PathBuf,
        image: String,
        source: BoxError,
    },

    #[error("failed to {action}: {source}")]
    ClusterSubmission {
        action: &'static str,
        source: BoxError,
    },

    #[error("{resource} failed: {reason}")]
    BuildFailed { resource: String, reason: String },

    #[error("deadline exceeded while waiting for {0}")]
    Timeout(String),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    pub fn cluster_submission(action: &'static str) -> impl FnOnce(BoxError) -> Self {
        move |source| Error::ClusterSubmission { action, source }
    }

    /// A child process killed by Ctrl+C fails too. Report that as an interruption.
    pub fn unless_interrupted(self) -> Self {
        self.interrupted_if(cancel::is_interrupted())
    }

    fn interrupted_if(self, interrupted: bool) -> Self {
        if interrupted {
            Error::Interrupted
        } else {
            self
        }
    }
}
