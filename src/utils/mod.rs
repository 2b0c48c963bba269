//! Utilities (source file input, unicode helpers).

pub mod unicode;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Read source code from a file, or from stdin when `path` is `-`.
pub fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read source from stdin")?;
        return Ok(buf);
    }

    let p = Path::new(path);
    if !p.exists() {
        bail!("Source file '{}' does not exist", path);
    }
    if !p.is_file() {
        bail!("'{}' is not a file", path);
    }
    fs::read_to_string(p).with_context(|| format!("Failed to read file '{}'", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_source_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "print('hi')").unwrap();
        let text = read_source(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "print('hi')");
    }

    #[test]
    fn test_read_source_missing() {
        let err = read_source("definitely/not/here.py").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_read_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }
}
