//! Packages a local directory into a self-extracting container image and pushes it.
//!
//! The image copies its payload into the working directory it is started in. The strategies run
//! it as their first step to place the source where the build expects it.

use std::path::{Path, PathBuf};

use image_reference::ImageReference;
use log::{debug, info};

use crate::{process, temp_path, Result};

/// Where the payload lives inside the bundle image.
pub const BUNDLE_PAYLOAD_DIR: &str = "/var/run/knbuild/source";

const BUNDLE_BASE_IMAGE: &str = "docker.io/library/busybox:1.36.1";

/// The bundle is always extracted on the cluster.
const BUNDLE_PLATFORM: &str = "linux/amd64";

fn bundle_dockerfile() -> String {
    format!(
        "FROM {BUNDLE_BASE_IMAGE}\n\
         COPY . {BUNDLE_PAYLOAD_DIR}\n\
         ENTRYPOINT [\"/bin/sh\", \"-c\", \"cp -R {BUNDLE_PAYLOAD_DIR}/. .\"]\n"
    )
}

/// Partial implementation of the JSON emitted by the `--metadata-file` option of `docker build`.
/// See https://docs.docker.com/reference/cli/docker/buildx/build/#metadata-file.
#[derive(serde::Deserialize)]
struct MetadataFile {
    #[serde(rename = "containerimage.digest")]
    containerimage_digest: String,
}

/// Removes the file when dropped.
struct TempFile(PathBuf);

impl TempFile {
    fn new(extension: &str) -> Self {
        Self(temp_path::tmp_path(extension))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.0) {
            if error.kind() != std::io::ErrorKind::NotFound {
                debug!("Failed to remove {}: {error}", self.0.display());
            }
        }
    }
}

pub struct BundleArgs<'a> {
    pub directory: &'a Path,
    pub image: &'a ImageReference,
}

pub struct BundleOutput {
    pub digest: String,
}

pub fn bundle(args: BundleArgs) -> Result<BundleOutput> {
    let BundleArgs { directory, image } = args;

    let dockerfile = TempFile::new("Dockerfile");
    std::fs::write(dockerfile.path(), bundle_dockerfile())?;

    let metadata_file = TempFile::new("json");

    info!(
        "Bundling {directory} into {image}...",
        directory = directory.display()
    );

    // The build output goes to stderr, stdout only carries the resulting image.
    process::command!(
        "docker",
        "buildx",
        "build",
        directory,
        "--file",
        dockerfile.path(),
        "--tag",
        image.to_string(),
        "--platform",
        BUNDLE_PLATFORM,
        "--provenance=false",
        "--metadata-file",
        metadata_file.path(),
        "--push",
    )
    .stdout_to_stderr()
    .status()?;

    let metadata: MetadataFile = serde_json::from_str(&std::fs::read_to_string(metadata_file.path())?)?;
    debug!("Pushed {}", image.pinned(&metadata.containerimage_digest));

    Ok(BundleOutput {
        digest: metadata.containerimage_digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dockerfile_extracts_into_working_directory() {
        assert_eq!(
            bundle_dockerfile(),
            "FROM docker.io/library/busybox:1.36.1\n\
             COPY . /var/run/knbuild/source\n\
             ENTRYPOINT [\"/bin/sh\", \"-c\", \"cp -R /var/run/knbuild/source/. .\"]\n"
        );
    }

    #[test]
    fn metadata_file_digest() {
        let metadata: MetadataFile = serde_json::from_str(
            r#"{
                "buildx.build.ref": "default/default/x1",
                "containerimage.descriptor": { "mediaType": "application/vnd.oci.image.manifest.v1+json" },
                "containerimage.digest": "sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdaab7c610cf7d66709b3b",
                "image.name": "registry.example.com/app_source:v1"
            }"#,
        )
        .unwrap();
        assert_eq!(
            metadata.containerimage_digest,
            "sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdaab7c610cf7d66709b3b"
        );
    }

    #[test]
    fn temp_files_are_removed_on_drop() {
        let file = TempFile::new("txt");
        std::fs::write(file.path(), "x").unwrap();
        let path = file.path().to_owned();
        drop(file);
        assert!(!path.exists());
    }
}
