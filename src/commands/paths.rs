use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Where the session and demo data live when `--state-dir` is not given.
#[tracing::instrument(skip(runtime))]
pub fn default_state_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let dir = match runtime.config_dir() {
        Some(config_dir) => config_dir.join("photoshelf"),
        None => runtime
            .home_dir()
            .context("Could not find home directory")?
            .join(".photoshelf"),
    };
    info!("Using state dir: {}", dir.display());
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_prefers_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        let dir = default_state_dir(&runtime).unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.config/photoshelf"));
    }

    #[test]
    fn test_falls_back_to_home() {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));

        let dir = default_state_dir(&runtime).unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.photoshelf"));
    }

    #[test]
    fn test_no_home_is_an_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);
        runtime.expect_home_dir().returning(|| None);

        assert!(default_state_dir(&runtime).is_err());
    }
}
