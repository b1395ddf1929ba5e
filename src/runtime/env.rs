//! Well-known directories.

use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn config_dir_impl(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_dirs() {
        let runtime = RealRuntime;

        // CI might not have a home directory
        let home = runtime.home_dir();
        assert!(home.is_some() || cfg!(target_os = "linux"));
        let _ = runtime.config_dir();
    }
}
