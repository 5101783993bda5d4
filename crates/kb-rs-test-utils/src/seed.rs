use std::path::{Path, PathBuf};

/// Write `entries` separated by blank lines to `<dir>/<name>`.
pub fn write_seed_file(dir: &Path, name: &str, entries: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, entries.join("\n\n")).expect("write seed file");
    path
}
