use std::collections::HashMap;

use log::debug;

use crate::kubectl::{self, annotation, is_rfc_1123_label};

pub fn expect_label(value: &str) -> Result<String, &'static str> {
    if !is_rfc_1123_label(value) {
        return Err("expected an RFC 1123 label of at most 63 characters matching regex /^[a-z0-9]([-a-z0-9]*[a-z0-9])?$/");
    }
    Ok(value.to_string())
}

/// Identifies who submitted a build as `user@host`.
pub fn submitter() -> String {
    let user = whoami::username();
    match whoami::fallible::hostname() {
        Ok(host) => format!("{user}@{host}"),
        Err(error) => {
            debug!("Failed to determine the hostname: {error}");
            user
        }
    }
}

pub fn annotations(submitter: &str, source_image: &str) -> HashMap<String, String> {
    [
        (annotation::VERSION, crate::version::VERSION),
        (annotation::SUBMITTED_BY, submitter),
        (annotation::SOURCE_IMAGE, source_image),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect()
}

pub fn submitted_by(metadata: &kubectl::ResourceMetadata) -> Option<&str> {
    metadata
        .annotations
        .get(annotation::SUBMITTED_BY)
        .map(String::as_str)
}
