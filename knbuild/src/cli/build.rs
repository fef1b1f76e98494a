use std::{path::PathBuf, time::Duration};

use clap::{Args, ValueEnum};
use constcat::concat;
use image_reference::ImageReference;
use log::{debug, info, warn};

use super::{common, ClusterArgs};
use crate::{
    assemble::{BuildRequest, StrategyKind},
    bundle::{self, BundleArgs},
    image,
    strategy::StrategyCatalog,
    submit::{Backend, ShipwrightBackend, SubmitArgs, TektonBackend},
    Error,
};

pub const DEFAULT_REGISTRY_SECRET: &str = "icr-knbuild";

/// One hour.
const DEFAULT_TIMEOUT_SECS: &str = "3600";

#[derive(Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BackendKind {
    /// Submit a Build and a BuildRun to Shipwright.
    #[default]
    Shipwright,

    /// Submit a TaskRun directly to Tekton.
    Tekton,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Name of the Build, an RFC 1123 label of at most 63 characters.
    #[arg(short = 'n', long = "name", value_parser = common::expect_label)]
    pub name: String,

    /// The directory to build.
    #[arg(short = 'd', long = "directory", default_value = ".")]
    pub directory: PathBuf,

    #[arg(short = 'i', long = "image", help = concat!("The image to build, as registry/repository:tag. The directory is pushed to the same registry and tag under the repository name suffixed with \"", image::SOURCE_IMAGE_SUFFIX, "\"."))]
    pub image: ImageReference,

    /// The build strategy, either "kaniko" or "buildpack".
    #[arg(short = 's', long = "strategy")]
    pub strategy: String,

    /// Secret of type kubernetes.io/dockerconfigjson holding the credentials of the registry.
    #[arg(
        long = "registry-secret",
        visible_alias = "secret",
        env = "KNBUILD_REGISTRY_SECRET",
        default_value = DEFAULT_REGISTRY_SECRET
    )]
    pub registry_secret: String,

    #[arg(long = "backend", value_enum, default_value_t)]
    pub backend: BackendKind,

    /// Whether to apply the strategy as a BuildStrategy in the namespace or as a
    /// ClusterBuildStrategy.
    #[arg(long = "strategy-kind", value_enum, default_value_t)]
    pub strategy_kind: StrategyKind,

    /// The service account to run the build with. By default Shipwright generates one that
    /// carries the registry secret.
    #[arg(long = "service-account")]
    pub service_account: Option<String>,

    /// How long to wait for the build to complete, in seconds.
    #[arg(long = "timeout", default_value = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

pub fn build(cluster: &ClusterArgs, args: BuildArgs) -> Result<(), Error> {
    let BuildArgs {
        name,
        directory,
        image,
        strategy,
        registry_secret,
        backend,
        strategy_kind,
        service_account,
        timeout,
    } = args;

    let catalog = StrategyCatalog::load()?;
    let template = catalog.resolve(&strategy)?;

    if !directory.is_dir() {
        return Err(Error::Validation(format!(
            "directory {} does not exist or is not a directory",
            directory.display()
        )));
    }

    let source_image = image::source_image(&image)?;
    debug!("source image: {source_image}");

    let kubectl = cluster.kubectl();
    let namespace = cluster
        .namespace(&kubectl)
        .map_err(Error::cluster_submission("determine the namespace"))?;

    let source_digest = bundle::bundle(BundleArgs {
        directory: &directory,
        image: &source_image,
    })
    .map_err(|source| {
        Error::Bundling {
            directory: directory.clone(),
            image: source_image.to_string(),
            source,
        }
        .unless_interrupted()
    })?
    .digest;
    let pinned_source_image = source_image.pinned(&source_digest);
    info!("Pushed {pinned_source_image}");

    let submitter = common::submitter();
    let request = BuildRequest {
        name: &name,
        namespace: &namespace,
        image: &image,
        source_image: &pinned_source_image,
        secret_name: &registry_secret,
        strategy: template.name(),
        strategy_kind,
        service_account: service_account.as_deref(),
        annotations: common::annotations(&submitter, &pinned_source_image),
    };

    let backend: &dyn Backend = match backend {
        BackendKind::Shipwright => &ShipwrightBackend,
        BackendKind::Tekton => &TektonBackend,
    };

    let output = backend.submit(SubmitArgs {
        kubectl: &kubectl,
        request: &request,
        template,
        timeout: Duration::from_secs(timeout),
    })?;

    match output.digest {
        Some(digest) => println!("{}", image.pinned(&digest)),
        None => warn!("The build succeeded but did not report the digest of {image}"),
    }

    Ok(())
}
