//! Small file and numeric helpers shared by the loaders.

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Result, XimlError};

/// Fail with a configuration error unless `path` names a readable file.
pub fn check_file_readable(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(XimlError::config("Empty file name"));
    }
    if !path.is_file() || File::open(path).is_err() {
        return Err(XimlError::config(format!(
            "File '{}' is missing or not readable",
            path.display()
        )));
    }
    Ok(())
}

/// Create the parent directories of `path` if they do not exist yet.
pub fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read a whole file as UTF-8, wrapping failures with the file name.
pub fn read_to_string(path: &Path) -> Result<String> {
    check_file_readable(path)?;
    fs::read_to_string(path)
        .map_err(|e| XimlError::caught(format!("Reading file '{}'", path.display()), e))
}

/// Round to a fixed number of decimal places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.574442516811659, 7), 0.5744425);
        assert_eq!(round_to(1.0 - 0.5744425, 7), 0.4255575);
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(0.0, 7), 0.0);
    }

    #[test]
    fn test_check_file_readable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(check_file_readable(&missing).is_err());
        assert!(check_file_readable(Path::new("")).is_err());
        // Directories are not files.
        assert!(check_file_readable(dir.path()).is_err());

        let present = dir.path().join("present.json");
        fs::write(&present, "{}").unwrap();
        assert!(check_file_readable(&present).is_ok());
    }

    #[test]
    fn test_create_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c/out.jsonl");
        create_parent_dirs(&nested).unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
        create_parent_dirs(Path::new("relative.jsonl")).unwrap();
    }
}
