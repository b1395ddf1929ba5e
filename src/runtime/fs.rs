//! File system operations (read, write, directory).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents)
            .with_context(|| format!("Failed to write to file {:?}", path))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read file {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn rename_impl(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).context("Failed to rename file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime, write_atomic};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_file_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("session.json");

        runtime.write(&file_path, b"{\"token\":null}").unwrap();
        assert!(runtime.exists(&file_path));

        assert_eq!(
            runtime.read_to_string(&file_path).unwrap(),
            "{\"token\":null}"
        );
        assert_eq!(runtime.read(&file_path).unwrap(), b"{\"token\":null}");

        let new_path = dir.path().join("renamed.json");
        runtime.rename(&file_path, &new_path).unwrap();
        assert!(!runtime.exists(&file_path));
        assert!(runtime.exists(&new_path));

        runtime.remove_file(&new_path).unwrap();
        assert!(!runtime.exists(&new_path));
    }

    #[test]
    fn test_write_atomic_with_real_runtime() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/state/demo.json");

        write_atomic(&runtime, &target, b"[]").unwrap();

        assert_eq!(runtime.read_to_string(&target).unwrap(), "[]");
        assert!(!runtime.exists(&target.with_extension("tmp")));
    }

    #[test]
    fn test_real_runtime_errors() {
        let runtime = RealRuntime;

        let result = runtime.read_to_string(std::path::Path::new("/nonexistent/path/file.txt"));
        assert!(result.is_err());

        let result = runtime.remove_file(std::path::Path::new("/nonexistent/path/file.txt"));
        assert!(result.is_err());
    }
}
