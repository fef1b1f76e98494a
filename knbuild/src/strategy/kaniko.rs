use super::{Strategy, StrategyName};

/// Builds the `Dockerfile` at the root of the source with
/// [kaniko](https://github.com/GoogleContainerTools/kaniko).
pub struct Kaniko;

impl Strategy for Kaniko {
    fn name(&self) -> StrategyName {
        StrategyName::Kaniko
    }

    fn document(&self) -> &'static str {
        include_str!("kaniko.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SOURCE_IMAGE_PLACEHOLDER;

    #[test]
    fn extracts_builds_and_reports_the_digest() {
        let template = Kaniko.template().unwrap();
        let step_names = template
            .steps()
            .iter()
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            step_names,
            ["extract-bundle", "build-and-push", "report-digest"]
        );

        let extract = &template.steps()[0];
        assert_eq!(extract.image.as_deref(), Some(SOURCE_IMAGE_PLACEHOLDER));

        let build = &template.steps()[1];
        let args = build.args.as_deref().unwrap_or_default();
        assert!(args.contains(&"--destination=$(params.shp-output-image)".to_owned()));
        assert!(args.contains(&"--digest-file=$(results.shp-image-digest.path)".to_owned()));
        assert!(build.resources.as_ref().and_then(|r| r.limits.as_ref()).is_some());
    }
}
