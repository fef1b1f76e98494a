use super::{Strategy, StrategyName};

/// Builds the source with [Cloud Native Buildpacks](https://buildpacks.io) using the lifecycle
/// `creator` of the Paketo builder.
pub struct Buildpack;

impl Strategy for Buildpack {
    fn name(&self) -> StrategyName {
        StrategyName::Buildpack
    }

    fn document(&self) -> &'static str {
        include_str!("buildpacks.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepares_extracts_and_creates() {
        let template = Buildpack.template().unwrap();
        let step_names = template
            .steps()
            .iter()
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(step_names, ["prepare", "extract-bundle", "build-and-push"]);

        let prepare = &template.steps()[0];
        let security_context = prepare.security_context.as_ref().unwrap();
        assert_eq!(security_context.run_as_user, Some(0));

        let create = &template.steps()[2];
        assert_eq!(
            create.command.as_deref(),
            Some(&["/cnb/lifecycle/creator".to_owned()][..])
        );
        let mounts = create
            .volume_mounts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|mount| mount.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(mounts, ["cache-dir", "layers-dir"]);
    }
}
