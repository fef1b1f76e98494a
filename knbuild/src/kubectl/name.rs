fn is_ascii_lowercase_numeric(byte: u8) -> bool {
    matches!(byte, b'a'..=b'z' | b'0'..=b'9')
}

fn is_ascii_lowercase_numeric_or_dash(byte: u8) -> bool {
    matches!(byte, b'a'..=b'z' | b'0'..=b'9' | b'-')
}

/// Maximum length of a label, see
/// https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#dns-label-names.
pub const MAX_LABEL_LEN: usize = 63;

/// Returns true if the input matches the regex `^[a-z0-9]([-a-z0-9]*[a-z0-9])?$` and is at most
/// 63 characters long, see
/// https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#dns-label-names.
///
/// Shipwright copies the name of a Build into a label on every BuildRun, so Build names must be
/// labels and not merely DNS subdomains.
pub fn is_rfc_1123_label(value: &(impl AsRef<[u8]> + ?Sized)) -> bool {
    fn inner(value: &[u8]) -> bool {
        match value {
            [] => false,
            [only] => is_ascii_lowercase_numeric(*only),
            [first, middle @ .., last] => {
                value.len() <= MAX_LABEL_LEN
                    && is_ascii_lowercase_numeric(*first)
                    && middle
                        .iter()
                        .copied()
                        .all(is_ascii_lowercase_numeric_or_dash)
                    && is_ascii_lowercase_numeric(*last)
            }
        }
    }
    inner(value.as_ref())
}
