use clap::Args;

use super::ClusterArgs;
use crate::{
    assemble::{self, StrategyKind},
    strategy::StrategyCatalog,
    Result,
};

#[derive(Debug, Args)]
pub struct StrategyArgs {
    /// The build strategy, either "kaniko" or "buildpack".
    pub name: String,

    #[arg(long = "kind", value_enum, default_value_t)]
    pub kind: StrategyKind,
}

/// Prints the strategy object as YAML. Does not contact the cluster, the namespace is only set
/// when passed explicitly.
pub fn strategy(cluster: &ClusterArgs, args: StrategyArgs) -> Result<()> {
    let catalog = StrategyCatalog::load()?;
    let template = catalog.resolve(&args.name)?;

    let object = assemble::assemble_strategy(template, args.kind, cluster.namespace.as_deref());
    print!("{}", serde_yaml::to_string(&object)?);

    Ok(())
}
