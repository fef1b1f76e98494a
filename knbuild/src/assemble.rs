//! Turns a [`BuildRequest`] and a [`BuildStrategyTemplate`] into the objects that are submitted to
//! the cluster. Nothing in here talks to the cluster, the output only depends on the input.

use std::collections::HashMap;

use ::kubernetes::models as k8s;
use clap::ValueEnum;
use image_reference::ImageReference;

use crate::{
    kubectl::annotation,
    resources::{
        shipwright::{self, param},
        tekton, LocalObjectReference,
    },
    strategy::{BuildStrategyTemplate, StrategyName, SOURCE_IMAGE_PARAM, SOURCE_IMAGE_PLACEHOLDER},
};

/// Shipwright creates the objects with a git source, the strategies ignore it and extract the
/// bundled source instead.
pub const PLACEHOLDER_GIT_URL: &str = "https://github.com/zhangtbj/empty-for-local-build";

/// Where the registry credentials are mounted in every step of a TaskRun.
pub const DOCKER_CONFIG_MOUNT: &str = "/var/run/knbuild/docker";

const DOCKER_CONFIG_VOLUME: &str = "knbuild-docker-config";

#[derive(Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StrategyKind {
    /// A `BuildStrategy` in the namespace of the build.
    #[default]
    Namespaced,

    /// A `ClusterBuildStrategy`, shared by all namespaces.
    Cluster,
}

impl StrategyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Namespaced => "BuildStrategy",
            StrategyKind::Cluster => "ClusterBuildStrategy",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub image: &'a ImageReference,
    /// The bundled source, pinned by digest.
    pub source_image: &'a str,
    pub secret_name: &'a str,
    pub strategy: StrategyName,
    pub strategy_kind: StrategyKind,
    /// When absent, Shipwright generates a service account that carries the registry secret.
    pub service_account: Option<&'a str>,
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResourceSet {
    pub strategy: shipwright::BuildStrategy,
    pub build: shipwright::Build,
    pub build_run: shipwright::BuildRun,
}

pub fn assemble(req: &BuildRequest, template: &BuildStrategyTemplate) -> ClusterResourceSet {
    debug_assert_eq!(req.strategy, template.name());

    let strategy = assemble_strategy(template, req.strategy_kind, Some(req.namespace));

    let build = shipwright::Build {
        api_version: shipwright::API_VERSION.to_owned(),
        kind: shipwright::BUILD_KIND.to_owned(),
        metadata: k8s::V1ObjectMeta {
            name: Some(req.name.to_owned()),
            namespace: Some(req.namespace.to_owned()),
            annotations: Some(req.annotations.clone()),
            ..Default::default()
        },
        spec: shipwright::BuildSpec {
            source: shipwright::GitSource {
                url: PLACEHOLDER_GIT_URL.to_owned(),
            },
            strategy: shipwright::StrategyRef {
                name: template.object_name().to_owned(),
                kind: req.strategy_kind.as_str().to_owned(),
            },
            param_values: Vec::new(),
            output: shipwright::Image {
                image: req.image.to_string(),
                credentials: Some(LocalObjectReference {
                    name: req.secret_name.to_owned(),
                }),
            },
        },
    };

    let build_run = shipwright::BuildRun {
        api_version: shipwright::API_VERSION.to_owned(),
        kind: shipwright::BUILD_RUN_KIND.to_owned(),
        metadata: k8s::V1ObjectMeta {
            generate_name: Some(format!("{}-", req.name)),
            namespace: Some(req.namespace.to_owned()),
            annotations: Some(req.annotations.clone()),
            ..Default::default()
        },
        spec: shipwright::BuildRunSpec {
            build_ref: LocalObjectReference {
                name: req.name.to_owned(),
            },
            service_account: match req.service_account {
                Some(name) => shipwright::ServiceAccount {
                    name: Some(name.to_owned()),
                    generate: false,
                },
                None => shipwright::ServiceAccount {
                    name: None,
                    generate: true,
                },
            },
            param_values: vec![shipwright::ParamValue {
                name: SOURCE_IMAGE_PARAM.to_owned(),
                value: req.source_image.to_owned(),
            }],
        },
    };

    ClusterResourceSet {
        strategy,
        build,
        build_run,
    }
}

/// The strategy object as it is applied to the cluster. The namespace is only set for a
/// namespaced strategy.
pub fn assemble_strategy(
    template: &BuildStrategyTemplate,
    kind: StrategyKind,
    namespace: Option<&str>,
) -> shipwright::BuildStrategy {
    shipwright::BuildStrategy {
        api_version: shipwright::API_VERSION.to_owned(),
        kind: kind.as_str().to_owned(),
        metadata: k8s::V1ObjectMeta {
            name: Some(template.object_name().to_owned()),
            namespace: match kind {
                StrategyKind::Namespaced => namespace.map(str::to_owned),
                StrategyKind::Cluster => None,
            },
            annotations: Some(
                [(
                    annotation::VERSION.to_owned(),
                    crate::version::VERSION.to_owned(),
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: shipwright::BuildStrategySpec {
            parameters: template.parameters().to_vec(),
            build_steps: template.steps().to_vec(),
        },
    }
}

/// Placeholders of the strategy documents and what they become in a TaskRun.
fn task_run_substitutions() -> [(&'static str, String); 4] {
    [
        (
            param::OUTPUT_IMAGE,
            format!("$(params.{})", tekton::IMAGE_TARGET_PARAM),
        ),
        (
            SOURCE_IMAGE_PLACEHOLDER,
            format!("$(params.{})", tekton::SOURCE_BUNDLE_PARAM),
        ),
        (param::SOURCE_ROOT, shipwright::SOURCE_ROOT.to_owned()),
        (
            param::IMAGE_DIGEST_RESULT_PATH,
            format!("$(results.{}.path)", tekton::IMAGE_DIGEST_RESULT),
        ),
    ]
}

fn substitute(value: &str, substitutions: &[(&str, String)]) -> String {
    substitutions
        .iter()
        .fold(value.to_owned(), |value, (from, to)| value.replace(from, to))
}

/// Renders the template as a single Tekton TaskRun that does not need Shipwright.
pub fn assemble_task_run(req: &BuildRequest, template: &BuildStrategyTemplate) -> tekton::TaskRun {
    debug_assert_eq!(req.strategy, template.name());

    let substitutions = task_run_substitutions();
    let substitute_all = |values: &Option<Vec<String>>| {
        values.as_ref().map(|values| {
            values
                .iter()
                .map(|value| substitute(value, &substitutions))
                .collect::<Vec<_>>()
        })
    };

    let steps = template
        .steps()
        .iter()
        .map(|step| {
            let env = step
                .env
                .iter()
                .flatten()
                .filter(|var| var.name != "DOCKER_CONFIG")
                .map(|var| k8s::V1EnvVar {
                    value: var
                        .value
                        .as_deref()
                        .map(|value| substitute(value, &substitutions)),
                    ..var.clone()
                })
                .chain(std::iter::once(k8s::V1EnvVar {
                    name: "DOCKER_CONFIG".to_owned(),
                    value: Some(DOCKER_CONFIG_MOUNT.to_owned()),
                    ..Default::default()
                }))
                .collect();

            let volume_mounts = step
                .volume_mounts
                .iter()
                .flatten()
                .cloned()
                .chain(std::iter::once(k8s::V1VolumeMount {
                    name: DOCKER_CONFIG_VOLUME.to_owned(),
                    mount_path: DOCKER_CONFIG_MOUNT.to_owned(),
                    read_only: Some(true),
                    ..Default::default()
                }))
                .collect();

            k8s::V1Container {
                image: step
                    .image
                    .as_deref()
                    .map(|image| substitute(image, &substitutions)),
                command: substitute_all(&step.command),
                args: substitute_all(&step.args),
                working_dir: step
                    .working_dir
                    .as_deref()
                    .map(|dir| substitute(dir, &substitutions)),
                env: Some(env),
                volume_mounts: Some(volume_mounts),
                ..step.clone()
            }
        })
        .collect::<Vec<_>>();

    // Every volume the strategy mounts is scratch space.
    let mut scratch_volumes = Vec::<&str>::new();
    for mount in template.steps().iter().flat_map(|step| step.volume_mounts.iter().flatten()) {
        if !scratch_volumes.contains(&mount.name.as_str()) {
            scratch_volumes.push(&mount.name);
        }
    }

    let volumes = std::iter::once(k8s::V1Volume {
        name: DOCKER_CONFIG_VOLUME.to_owned(),
        secret: Some(Box::new(k8s::V1SecretVolumeSource {
            secret_name: Some(req.secret_name.to_owned()),
            items: Some(vec![k8s::V1KeyToPath {
                key: ".dockerconfigjson".to_owned(),
                path: "config.json".to_owned(),
                ..Default::default()
            }]),
            ..Default::default()
        })),
        ..Default::default()
    })
    .chain(scratch_volumes.into_iter().map(|name| k8s::V1Volume {
        name: name.to_owned(),
        empty_dir: Some(Box::new(k8s::V1EmptyDirVolumeSource::default())),
        ..Default::default()
    }))
    .collect();

    tekton::TaskRun {
        api_version: tekton::API_VERSION.to_owned(),
        kind: tekton::TASK_RUN_KIND.to_owned(),
        metadata: k8s::V1ObjectMeta {
            generate_name: Some(format!("{}-", req.name)),
            namespace: Some(req.namespace.to_owned()),
            annotations: Some(req.annotations.clone()),
            ..Default::default()
        },
        spec: tekton::TaskRunSpec {
            service_account_name: req.service_account.map(str::to_owned),
            params: vec![
                tekton::Param {
                    name: tekton::SOURCE_BUNDLE_PARAM.to_owned(),
                    value: req.source_image.to_owned(),
                },
                tekton::Param {
                    name: tekton::IMAGE_TARGET_PARAM.to_owned(),
                    value: req.image.to_string(),
                },
            ],
            task_spec: tekton::TaskSpec {
                description: Some(format!(
                    "Builds {image} from a local directory with {strategy}.",
                    image = req.image,
                    strategy = template.object_name(),
                )),
                params: vec![
                    tekton::ParamSpec {
                        name: tekton::SOURCE_BUNDLE_PARAM.to_owned(),
                        description: "A self-extracting container image of the bundled local source.".to_owned(),
                    },
                    tekton::ParamSpec {
                        name: tekton::IMAGE_TARGET_PARAM.to_owned(),
                        description: "Where to publish the image.".to_owned(),
                    },
                ],
                results: vec![tekton::TaskResult {
                    name: tekton::IMAGE_DIGEST_RESULT.to_owned(),
                    description: "The digest of the published image.".to_owned(),
                }],
                steps,
                volumes,
            },
            pod_template: Some(tekton::PodTemplate {
                enable_service_links: Some(false),
                image_pull_secrets: vec![LocalObjectReference {
                    name: req.secret_name.to_owned(),
                }],
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyCatalog;

    fn request(image: &ImageReference, strategy: StrategyName) -> BuildRequest<'_> {
        BuildRequest {
            name: "app",
            namespace: "builds",
            image,
            source_image: "registry.example.com/app_source:v1@sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdaab7c610cf7d66709b3b",
            secret_name: "icr-knbuild",
            strategy,
            strategy_kind: StrategyKind::Namespaced,
            service_account: None,
            annotations: [(annotation::SUBMITTED_BY.to_owned(), "alice@laptop".to_owned())]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn kaniko_build_references_strategy_and_source() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        let req = request(&image, StrategyName::Kaniko);

        let set = assemble(&req, catalog.lookup(StrategyName::Kaniko));

        assert_eq!(set.strategy.kind, "BuildStrategy");
        assert_eq!(set.strategy.metadata.name.as_deref(), Some("kaniko-local"));
        assert_eq!(set.strategy.metadata.namespace.as_deref(), Some("builds"));

        let spec = &set.build.spec;
        assert_eq!(spec.strategy.name, "kaniko-local");
        assert_eq!(spec.strategy.kind, "BuildStrategy");
        assert_eq!(spec.output.image, "registry.example.com/app:v1");
        assert_eq!(
            spec.output.credentials,
            Some(LocalObjectReference {
                name: "icr-knbuild".to_owned()
            })
        );
        assert!(spec.param_values.is_empty());
        assert_eq!(spec.source.url, PLACEHOLDER_GIT_URL);

        assert_eq!(set.build_run.metadata.name, None);
        assert_eq!(set.build_run.metadata.generate_name.as_deref(), Some("app-"));
        assert_eq!(set.build_run.spec.build_ref.name, "app");
        assert!(set.build_run.spec.service_account.generate);
        let params = &set.build_run.spec.param_values;
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, SOURCE_IMAGE_PARAM);
        assert!(params[0]
            .value
            .starts_with("registry.example.com/app_source:v1@sha256:"));
        let build = serde_json::to_value(&set.build).unwrap();
        assert!(build["spec"].get("paramValues").is_none());
        let build_run = serde_json::to_value(&set.build_run).unwrap();
        assert_eq!(build_run["spec"]["paramValues"][0]["name"], SOURCE_IMAGE_PARAM);
        assert_eq!(
            set.build_run
                .metadata
                .annotations
                .as_ref()
                .and_then(|annotations| annotations.get(annotation::SUBMITTED_BY))
                .map(String::as_str),
            Some("alice@laptop")
        );
    }

    #[test]
    fn assemble_is_deterministic() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        for strategy in StrategyName::ALL {
            let req = request(&image, strategy);
            let template = catalog.lookup(strategy);
            assert_eq!(assemble(&req, template), assemble(&req, template));
            assert_eq!(
                serde_json::to_value(assemble_task_run(&req, template)).unwrap(),
                serde_json::to_value(assemble_task_run(&req, template)).unwrap()
            );
        }
    }

    #[test]
    fn cluster_strategies_have_no_namespace() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        let req = BuildRequest {
            strategy_kind: StrategyKind::Cluster,
            service_account: Some("builder"),
            ..request(&image, StrategyName::Buildpack)
        };

        let set = assemble(&req, catalog.lookup(StrategyName::Buildpack));
        assert_eq!(set.strategy.kind, "ClusterBuildStrategy");
        assert_eq!(set.strategy.metadata.namespace, None);
        assert_eq!(set.build.spec.strategy.name, "buildpacks-local");
        assert_eq!(set.build.spec.strategy.kind, "ClusterBuildStrategy");
        assert_eq!(
            set.build_run.spec.service_account,
            shipwright::ServiceAccount {
                name: Some("builder".to_owned()),
                generate: false
            }
        );
    }

    #[test]
    fn task_run_has_no_shipwright_placeholders() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        for strategy in StrategyName::ALL {
            let req = request(&image, strategy);
            let task_run = assemble_task_run(&req, catalog.lookup(strategy));
            let json = serde_json::to_string(&task_run).unwrap();
            assert!(!json.contains("shp-"), "{json}");
            assert!(!json.contains(SOURCE_IMAGE_PLACEHOLDER), "{json}");

            for step in &task_run.spec.task_spec.steps {
                let env = step.env.as_deref().unwrap_or_default();
                let docker_config = env
                    .iter()
                    .filter(|var| var.name == "DOCKER_CONFIG")
                    .collect::<Vec<_>>();
                assert_eq!(docker_config.len(), 1);
                assert_eq!(docker_config[0].value.as_deref(), Some(DOCKER_CONFIG_MOUNT));
            }

            let params = &task_run.spec.params;
            assert_eq!(params[0].name, tekton::SOURCE_BUNDLE_PARAM);
            assert_eq!(params[0].value, req.source_image);
            assert_eq!(params[1].name, tekton::IMAGE_TARGET_PARAM);
            assert_eq!(params[1].value, "registry.example.com/app:v1");
        }
    }

    #[test]
    fn task_run_translates_kaniko_arguments() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        let req = request(&image, StrategyName::Kaniko);
        let task_run = assemble_task_run(&req, catalog.lookup(StrategyName::Kaniko));

        let steps = &task_run.spec.task_spec.steps;
        assert_eq!(steps[0].image.as_deref(), Some("$(params.mink-source-bundle)"));
        assert_eq!(steps[0].working_dir.as_deref(), Some("/workspace/source"));

        let args = steps[1].args.as_deref().unwrap_or_default();
        assert!(args.contains(&"--destination=$(params.mink-image-target)".to_owned()));
        assert!(args.contains(&"--digest-file=$(results.mink-image-digest.path)".to_owned()));
        assert!(args.contains(&"--dockerfile=/workspace/source/Dockerfile".to_owned()));

        let volumes = &task_run.spec.task_spec.volumes;
        assert_eq!(volumes.len(), 1);
        let secret = volumes[0].secret.as_ref().unwrap();
        assert_eq!(secret.secret_name.as_deref(), Some("icr-knbuild"));

        assert_eq!(
            task_run.spec.pod_template,
            Some(tekton::PodTemplate {
                enable_service_links: Some(false),
                image_pull_secrets: vec![LocalObjectReference {
                    name: "icr-knbuild".to_owned()
                }],
            })
        );

        let json = serde_json::to_value(&task_run).unwrap();
        assert_eq!(
            json["spec"]["podTemplate"]["imagePullSecrets"],
            serde_json::json!([{ "name": "icr-knbuild" }])
        );
    }

    #[test]
    fn task_run_provides_scratch_volumes_for_buildpacks() {
        let catalog = StrategyCatalog::load().unwrap();
        let image = ImageReference::new("registry.example.com/app:v1").unwrap();
        let req = request(&image, StrategyName::Buildpack);
        let task_run = assemble_task_run(&req, catalog.lookup(StrategyName::Buildpack));

        let volumes = &task_run.spec.task_spec.volumes;
        let names = volumes
            .iter()
            .map(|volume| volume.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, [DOCKER_CONFIG_VOLUME, "cache-dir", "layers-dir"]);
        assert!(volumes[1].empty_dir.is_some());
        assert!(volumes[2].empty_dir.is_some());
    }
}
