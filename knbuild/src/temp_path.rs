use std::path::PathBuf;

/// Returns a fresh path in the system temporary directory, e.g. `/tmp/knbuild-Xq3…Zr.json`.
pub fn tmp_path(extension: &str) -> PathBuf {
    use rand::distributions::{Alphanumeric, DistString};

    const PREFIX: &str = "knbuild-";
    const LEN: usize = 16;

    let mut name = String::with_capacity(PREFIX.len() + LEN + 1 + extension.len());
    name.push_str(PREFIX);
    Alphanumeric.append_string(&mut rand::thread_rng(), &mut name, LEN);
    name.push('.');
    name.push_str(extension);
    std::env::temp_dir().join(name)
}

pub fn tmp_json_path() -> PathBuf {
    tmp_path("json")
}
