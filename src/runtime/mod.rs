//! Runtime abstraction for system operations.
//!
//! Everything that touches the environment, the file system or the terminal
//! goes through [`Runtime`] so the session and demo stores can be tested
//! against a mock.
//!
//! # Structure
//!
//! - `env` - Well-known directories
//! - `fs` - File system operations (read, write, atomic replace)
//! - `user` - User interaction (confirmation prompts, line input)

mod env;
mod fs;
mod user;

use anyhow::Result;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn config_dir(&self) -> Option<PathBuf>;

    // User interaction
    /// Prompt user for confirmation. Returns true if user confirms (y/yes), false otherwise.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Prompt user for a single line of input, without the trailing newline.
    fn read_line(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_impl(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirm_impl(prompt)
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        self.read_line_impl(prompt)
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
pub fn write_atomic<R: Runtime + ?Sized>(runtime: &R, path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !runtime.exists(parent) {
            runtime.create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    runtime.write(&tmp, contents)?;
    runtime.rename(&tmp, path)?;
    Ok(())
}
