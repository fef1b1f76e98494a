//! Tagged container image references, written as:
//!
//! ```txt
//! reference   := [registry '/'] repository ':' tag
//! registry    := domain-component ['.' domain-component]* [':' port-number] | 'localhost'
//! repository  := path-component ['/' path-component]*
//! path-component := /[a-z0-9]+((?:[_.]|__|[-]+)[a-z0-9]+)*/
//! tag         := /[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}/
//! ```
//!
//! This is the subset of the [distribution reference
//! grammar](https://github.com/distribution/reference/blob/v0.6.0/reference.go) that names an image
//! by tag. A reference with a digest is rejected because the tag is what gets pushed to.
//!
//! References are normalized like `docker pull` does: a missing registry means Docker Hub
//! (`index.docker.io`) and single component Docker Hub repositories live under `library/`.

use std::{fmt, str::FromStr, sync::LazyLock};

#[cfg(feature = "serde")]
use ::serde::{Deserialize, Deserializer, Serialize, Serializer};
use regex::Regex;

pub const DEFAULT_REGISTRY: &str = "index.docker.io";
const LEGACY_DEFAULT_REGISTRY: &str = "docker.io";
const OFFICIAL_REPOSITORY_NAMESPACE: &str = "library";
const MAX_REPOSITORY_LEN: usize = 255;

const REGISTRY_SUFFIX: char = '/';
const TAG_PREFIX: char = ':';
const DIGEST_PREFIX: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidImageReference {
    Empty,
    Malformed(String),
    MissingTag(String),
    UnexpectedDigest(String),
    RepositoryTooLong(String),
}

impl std::error::Error for InvalidImageReference {}

impl fmt::Display for InvalidImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("image reference is empty"),
            Self::Malformed(value) => write!(
                f,
                "invalid image reference {value:?}, expected `registry/repository:tag`"
            ),
            Self::MissingTag(value) => {
                write!(f, "image reference {value:?} does not specify a tag")
            }
            Self::UnexpectedDigest(value) => write!(
                f,
                "image reference {value:?} contains a digest, expected `registry/repository:tag`"
            ),
            Self::RepositoryTooLong(repository) => write!(
                f,
                "repository {repository:?} is longer than {MAX_REPOSITORY_LEN} characters"
            ),
        }
    }
}

fn image_reference_regex() -> &'static Regex {
    static IMAGE_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(concat!(
            r"^",
            r"(?:(?P<registry>",
            r"[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)+(?::[0-9]+)?",
            r"|[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?:[0-9]+",
            r"|localhost",
            r")\/)?",
            r"(?P<repository>[a-z0-9]+(?:(?:[_.]|__|[-]+)[a-z0-9]+)*(?:\/[a-z0-9]+(?:(?:[_.]|__|[-]+)[a-z0-9]+)*)*)",
            r"(?::(?P<tag>[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}))?",
            r"(?:@(?P<digest>[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}))?",
            r"$"
        ))
        .expect("image reference regex is valid")
    });
    &IMAGE_REFERENCE_REGEX
}

/// A validated and normalized `registry/repository:tag` reference.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageReference {
    registry: String,
    repository: String,
    tag: String,
}

impl ImageReference {
    pub fn new(value: &str) -> Result<Self, InvalidImageReference> {
        if value.is_empty() {
            return Err(InvalidImageReference::Empty);
        }

        let captures = image_reference_regex()
            .captures(value)
            .ok_or_else(|| InvalidImageReference::Malformed(value.to_owned()))?;

        if captures.name("digest").is_some() {
            return Err(InvalidImageReference::UnexpectedDigest(value.to_owned()));
        }

        let tag = captures
            .name("tag")
            .ok_or_else(|| InvalidImageReference::MissingTag(value.to_owned()))?
            .as_str();

        let reference = Self::normalized(
            captures.name("registry").map(|m| m.as_str()),
            &captures["repository"],
            tag,
        );

        if reference.repository.len() > MAX_REPOSITORY_LEN {
            return Err(InvalidImageReference::RepositoryTooLong(reference.repository));
        }

        Ok(reference)
    }

    fn normalized(registry: Option<&str>, repository: &str, tag: &str) -> Self {
        let registry = match registry {
            None | Some(LEGACY_DEFAULT_REGISTRY) => DEFAULT_REGISTRY,
            Some(registry) => registry,
        };

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains(REGISTRY_SUFFIX) {
            format!("{OFFICIAL_REPOSITORY_NAMESPACE}/{repository}")
        } else {
            repository.to_owned()
        };

        Self {
            registry: registry.to_owned(),
            repository,
            tag: tag.to_owned(),
        }
    }

    /// Returns the `<registry>` section, `index.docker.io` when none was written.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Returns the `<repository>` section.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the `<tag>` section.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns a reference to `<registry>/<repository><suffix>:<tag>`. Fails when the suffix
    /// produces a repository name that does not match the grammar or is too long.
    pub fn with_repository_suffix(&self, suffix: &str) -> Result<Self, InvalidImageReference> {
        let repository = format!("{}{suffix}", self.repository);
        if repository.len() > MAX_REPOSITORY_LEN {
            return Err(InvalidImageReference::RepositoryTooLong(repository));
        }
        Self::new(&format!(
            "{registry}{REGISTRY_SUFFIX}{repository}{suffix}{TAG_PREFIX}{tag}",
            registry = self.registry,
            repository = self.repository,
            tag = self.tag,
        ))
    }

    /// Formats the reference pinned to `digest`, e.g. `reg.io/app:v1@sha256:...`.
    pub fn pinned(&self, digest: &str) -> String {
        format!("{self}{DIGEST_PREFIX}{digest}")
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{registry}{REGISTRY_SUFFIX}{repository}{TAG_PREFIX}{tag}",
            registry = self.registry,
            repository = self.repository,
            tag = self.tag,
        )
    }
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for ImageReference {
    type Err = InvalidImageReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ImageReference {
    type Error = InvalidImageReference;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageReference> for String {
    fn from(value: ImageReference) -> Self {
        value.to_string()
    }
}

#[cfg(feature = "serde")]
impl Serialize for ImageReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ImageReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: std::borrow::Cow<'de, str> = Deserialize::deserialize(deserializer)?;
        Self::new(&value).map_err(::serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_reference_parsing_works() {
        {
            let image = ImageReference::new("registry.example.com/app:v1").unwrap();
            assert_eq!(image.registry(), "registry.example.com");
            assert_eq!(image.repository(), "app");
            assert_eq!(image.tag(), "v1");
        }

        {
            let image = ImageReference::new("reg.io:5000/org-name/img_name:1.2.3-rc.1").unwrap();
            assert_eq!(image.registry(), "reg.io:5000");
            assert_eq!(image.repository(), "org-name/img_name");
            assert_eq!(image.tag(), "1.2.3-rc.1");
        }

        {
            let image = ImageReference::new("localhost/app:latest").unwrap();
            assert_eq!(image.registry(), "localhost");
            assert_eq!(image.repository(), "app");
        }

        {
            let image = ImageReference::new("myregistry:5000/app:v2").unwrap();
            assert_eq!(image.registry(), "myregistry:5000");
            assert_eq!(image.repository(), "app");
        }
    }

    #[test]
    fn docker_hub_references_are_normalized() {
        let image = ImageReference::new("app:v1").unwrap();
        assert_eq!(image.registry(), DEFAULT_REGISTRY);
        assert_eq!(image.repository(), "library/app");
        assert_eq!(image.to_string(), "index.docker.io/library/app:v1");

        let image = ImageReference::new("docker.io/org/app:v1").unwrap();
        assert_eq!(image.registry(), DEFAULT_REGISTRY);
        assert_eq!(image.repository(), "org/app");

        // The first component only counts as a registry with a dot, a port or as localhost.
        let image = ImageReference::new("org/app:v1").unwrap();
        assert_eq!(image.registry(), DEFAULT_REGISTRY);
        assert_eq!(image.repository(), "org/app");
    }

    #[test]
    fn invalid_image_references_are_rejected() {
        assert_eq!(ImageReference::new(""), Err(InvalidImageReference::Empty));
        assert_eq!(
            ImageReference::new("registry.example.com/app"),
            Err(InvalidImageReference::MissingTag(
                "registry.example.com/app".to_owned()
            ))
        );
        assert_eq!(
            ImageReference::new("registry.example.com/App:v1"),
            Err(InvalidImageReference::Malformed(
                "registry.example.com/App:v1".to_owned()
            ))
        );
        assert!(matches!(
            ImageReference::new("registry.example.com/app:v1 "),
            Err(InvalidImageReference::Malformed(_))
        ));
        assert!(matches!(
            ImageReference::new("registry.example.com/app:"),
            Err(InvalidImageReference::Malformed(_))
        ));
        assert!(matches!(
            ImageReference::new("reg.io/app:v1@sha256:01234567aaaaaaaa01234567aaaaaaaa"),
            Err(InvalidImageReference::UnexpectedDigest(_))
        ));
        assert!(matches!(
            ImageReference::new("reg.io/app:-v1"),
            Err(InvalidImageReference::Malformed(_))
        ));
        for value in ["registry.example.com/app:vé", "reg.io/app:ü1", "reg.io/app:v١"] {
            assert_eq!(
                ImageReference::new(value),
                Err(InvalidImageReference::Malformed(value.to_owned()))
            );
        }
        let long = format!("reg.io/{}:v1", "a".repeat(MAX_REPOSITORY_LEN + 1));
        assert!(matches!(
            ImageReference::new(&long),
            Err(InvalidImageReference::RepositoryTooLong(_))
        ));
    }

    #[test]
    fn digest_separators_are_recognized() {
        for separator in ["-", "_", "+", "."] {
            let value = format!("reg.io/app:v1@sha256{separator}b:01234567aaaaaaaa01234567aaaaaaaa");
            assert!(matches!(
                ImageReference::new(&value),
                Err(InvalidImageReference::UnexpectedDigest(_))
            ));
        }
        for separator in ["/", "=", "@"] {
            let value = format!("reg.io/app:v1@sha256{separator}b:01234567aaaaaaaa01234567aaaaaaaa");
            assert!(matches!(
                ImageReference::new(&value),
                Err(InvalidImageReference::Malformed(_))
            ));
        }
    }

    #[test]
    fn with_repository_suffix_keeps_registry_and_tag() {
        for value in [
            "registry.example.com/app:v1",
            "reg.io:5000/team/service:2024.10.01",
            "localhost/app:latest",
            "app:v1",
            "us.icr.io/namespace/my-app:sha-1234",
        ] {
            let image = ImageReference::new(value).unwrap();
            let source = image.with_repository_suffix("_source").unwrap();
            assert_eq!(source.registry(), image.registry());
            assert_eq!(source.repository(), format!("{}_source", image.repository()));
            assert_eq!(source.tag(), image.tag());
        }

        let image = ImageReference::new("reg.io/app:v1").unwrap();
        assert!(image.with_repository_suffix("/UPPER").is_err());

        let repository = "a".repeat(MAX_REPOSITORY_LEN - 2);
        let image = ImageReference::new(&format!("reg.io/{repository}:v1")).unwrap();
        let error = image.with_repository_suffix("_source").unwrap_err();
        assert_eq!(
            error,
            InvalidImageReference::RepositoryTooLong(format!("{repository}_source"))
        );
        assert!(error.to_string().contains("longer than 255 characters"));
    }

    #[test]
    fn pinned_appends_the_digest() {
        let image = ImageReference::new("reg.io/app:v1").unwrap();
        assert_eq!(image.pinned("sha256:abcd"), "reg.io/app:v1@sha256:abcd");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn image_reference_serde_works() {
        let des = ImageReference::new("reg.io/org-name/img-name:v1").unwrap();
        let ser = r#""reg.io/org-name/img-name:v1""#;
        assert_eq!(serde_json::to_string(&des).unwrap(), ser);
        assert_eq!(serde_json::from_str::<ImageReference>(ser).unwrap(), des);
        assert!(serde_json::from_str::<ImageReference>(r#""reg.io/app""#).is_err());
    }
}
