mod build;
mod common;
mod list;
mod strategy;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    kubectl::{self, Kubectl},
    Result,
};

#[derive(Debug, Parser)]
#[command(version = crate::version::VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    cluster: ClusterArgs,
}

/// Selects the cluster and namespace, passed through to `kubectl`.
#[derive(Debug, Args)]
pub struct ClusterArgs {
    /// Path to the kubeconfig file to use.
    #[arg(long = "kubeconfig", global = true)]
    kubeconfig: Option<PathBuf>,

    /// The name of the kubeconfig context to use.
    #[arg(long = "context", global = true)]
    context: Option<String>,

    /// The namespace to build in. Defaults to the namespace of the kubeconfig context, or
    /// "default" when it does not set one.
    #[arg(long = "namespace", global = true, env = "KNBUILD_NAMESPACE", value_parser = common::expect_label)]
    namespace: Option<String>,
}

impl ClusterArgs {
    pub fn kubectl(&self) -> Kubectl<'_> {
        Kubectl::new(self.kubeconfig.as_deref(), self.context.as_deref())
    }

    /// Resolves the namespace, asking kubectl for the namespace of the current context when none
    /// was provided.
    pub fn namespace(&self, kubectl: &Kubectl) -> Result<String> {
        if let Some(namespace) = self.namespace.as_deref() {
            return Ok(namespace.to_owned());
        }
        Ok(kubectl
            .current_namespace()?
            .unwrap_or_else(|| kubectl::DEFAULT_NAMESPACE.to_owned()))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build an image from a local directory on the cluster
    #[command(arg_required_else_help = true)]
    Build(build::BuildArgs),

    /// List the builds in the namespace
    List,

    /// Print a build strategy as it would be applied to the cluster
    #[command(arg_required_else_help = true)]
    Strategy(strategy::StrategyArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Build(args) => {
                build::build(&self.cluster, args)?;
            }
            Commands::List => {
                list::list(&self.cluster)?;
            }
            Commands::Strategy(args) => {
                strategy::strategy(&self.cluster, args)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
