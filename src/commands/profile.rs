use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::{
    api::{self, ProfileUpdate},
    domain::model::LocalFile,
    runtime::Runtime,
    validation::{FileRules, validate_file, validate_name},
};

use super::config::Config;
use super::report::{api_failure, field_failure};

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub banner: Option<PathBuf>,
    pub avatar: Option<PathBuf>,
    pub remove_banner: bool,
    pub remove_avatar: bool,
}

fn read_image<R: Runtime>(runtime: &R, path: &Path, label: &str) -> Result<LocalFile> {
    let file = LocalFile::read(runtime, path)?;
    let rules = FileRules {
        label: label.to_string(),
        ..Default::default()
    };
    validate_file(Some(&file), &rules).map_err(field_failure)?;
    Ok(file)
}

#[tracing::instrument(skip(config))]
pub async fn profile<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    changes: ProfileChanges,
) -> Result<()> {
    let user = config.require_user()?;
    if let Some(name) = &changes.name {
        validate_name(name, "Name").map_err(field_failure)?;
    }

    let update = ProfileUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        banner: match &changes.banner {
            Some(path) => Some(read_image(&config.runtime, path, "Banner")?),
            None => None,
        },
        profile: match &changes.avatar {
            Some(path) => Some(read_image(&config.runtime, path, "Profile image")?),
            None => None,
        },
        remove_banner: changes.remove_banner,
        remove_profile: changes.remove_avatar,
    };

    let response = if config.session.is_demo() {
        api::update_demo_profile(&config.demo_store(), &config.session, update)?
    } else {
        api::update_profile(&config.client, &user.email, update, None)
            .await
            .map_err(|e| api_failure(e, "Updating profile"))?
    };

    let name = response
        .user
        .as_ref()
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| user.display_name().to_string());
    println!("Profile of {} updated", name);
    println!("    avatar: {}", describe_image(response.profile.as_deref()));
    println!("    banner: {}", describe_image(response.banner.as_deref()));
    Ok(())
}

fn describe_image(url: Option<&str>) -> &str {
    match url {
        None => "(default)",
        Some(url) if url.starts_with("data:") => "(stored on this machine)",
        Some(url) => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_image() {
        assert_eq!(describe_image(None), "(default)");
        assert_eq!(describe_image(Some("data:image/png;base64,AA==")), "(stored on this machine)");
        assert_eq!(describe_image(Some("https://cdn/p.png")), "https://cdn/p.png");
    }
}
