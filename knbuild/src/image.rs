use image_reference::{ImageReference, InvalidImageReference};

/// Appended to the repository of the target image to name the image holding the bundled source.
pub const SOURCE_IMAGE_SUFFIX: &str = "_source";

/// Returns the reference the bundled source of `image` is pushed to, e.g.
/// `registry.example.com/app_source:v1` for `registry.example.com/app:v1`.
pub fn source_image(image: &ImageReference) -> Result<ImageReference, InvalidImageReference> {
    image.with_repository_suffix(SOURCE_IMAGE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_image_suffixes_the_repository() {
        for (image, expected) in [
            (
                "registry.example.com/app:v1",
                "registry.example.com/app_source:v1",
            ),
            (
                "us.icr.io/team/api-server:2024.10.1",
                "us.icr.io/team/api-server_source:2024.10.1",
            ),
            ("localhost:5000/app:latest", "localhost:5000/app_source:latest"),
            ("nginx:1.27", "index.docker.io/library/nginx_source:1.27"),
        ] {
            let image = ImageReference::new(image).unwrap();
            let source = source_image(&image).unwrap();
            assert_eq!(source.to_string(), expected);
            assert_eq!(source.registry(), image.registry());
            assert_eq!(source.tag(), image.tag());
            assert_eq!(
                source.repository(),
                format!("{}{SOURCE_IMAGE_SUFFIX}", image.repository())
            );
        }
    }
}
