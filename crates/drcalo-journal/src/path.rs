//! Output file naming

use std::path::{Path, PathBuf};

/// Output file of one run
///
/// With `files_by_run` the run tag `.run%08d` goes in front of the
/// extension: `sim.ron` becomes `sim.run00000012.ron`. A path without an
/// extension gets the tag appended. Without `files_by_run` the base path is
/// returned unchanged.
pub fn run_output_path(base: impl AsRef<Path>, run: i32, files_by_run: bool) -> PathBuf {
    let base = base.as_ref();
    if !files_by_run {
        return base.to_path_buf();
    }

    let tag = format!("run{:08}", run);
    let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}.{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}.{}", stem, tag),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_without_files_by_run() {
        assert_eq!(run_output_path("out/sim.ron", 3, false), PathBuf::from("out/sim.ron"));
    }

    #[test]
    fn test_tag_before_extension() {
        assert_eq!(
            run_output_path("out/sim.ron", 12, true),
            PathBuf::from("out/sim.run00000012.ron")
        );
    }

    #[test]
    fn test_tag_without_extension() {
        assert_eq!(run_output_path("sim", 7, true), PathBuf::from("sim.run00000007"));
    }
}
