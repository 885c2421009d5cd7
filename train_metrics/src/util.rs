//! Filesystem helpers.

use std::fs;
use std::path::Path;

use crate::error::MetricError;

/// Create `path` and any missing parents. An existing directory is not an
/// error; an existing file at `path` is.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<(), MetricError> {
    fs::create_dir_all(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("runs/exp1/logs");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_existing_dir_is_ok() {
        let dir = tempdir().unwrap();
        ensure_dir(dir.path()).unwrap();
        ensure_dir(dir.path()).unwrap();
    }

    #[test]
    fn test_file_in_the_way_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("output");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(ensure_dir(&file), Err(MetricError::Io(_))));
    }
}
