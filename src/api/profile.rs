use log::info;
use serde::Deserialize;

use crate::demo::DemoStore;
use crate::domain::model::{LocalFile, User};
use crate::http::{ApiClient, ApiError, ApiErrorKind, ProgressCallback, UploadForm};
use crate::http::error::STATUS_NO_RESPONSE;
use crate::runtime::Runtime;
use crate::session::SessionManager;

/// Changes to apply to the signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub banner: Option<LocalFile>,
    pub profile: Option<LocalFile>,
    pub remove_banner: bool,
    pub remove_profile: bool,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.banner.is_none()
            && self.profile.is_none()
            && !self.remove_banner
            && !self.remove_profile
    }

    fn into_form(self) -> UploadForm {
        let mut form = UploadForm::new();
        if let Some(file) = self.banner {
            form = form.file("bannerFile", file.file_name, file.mime, file.bytes);
        }
        if let Some(file) = self.profile {
            form = form.file("profileFile", file.file_name, file.mime, file.bytes);
        }
        if self.remove_banner {
            form = form.text("removeBanner", "true");
        }
        if self.remove_profile {
            form = form.text("removeProfile", "true");
        }
        if let Some(name) = self.name {
            form = form.text("name", name);
        }
        form
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    /// Current avatar URL
    #[serde(default)]
    pub profile: Option<String>,
    /// Current banner URL
    #[serde(default)]
    pub banner: Option<String>,
}

fn nothing_to_update() -> ApiError {
    ApiError::new(
        ApiErrorKind::Validation,
        STATUS_NO_RESPONSE,
        "Nothing to update",
    )
}

/// Sends `update` to the service and caches the returned user and image URLs.
#[tracing::instrument(skip(client, update, on_progress))]
pub async fn update_profile(
    client: &ApiClient,
    email: &str,
    update: ProfileUpdate,
    on_progress: Option<ProgressCallback>,
) -> Result<ProfileResponse, ApiError> {
    if update.is_empty() {
        return Err(nothing_to_update());
    }

    let path = format!("/api/user/update/{}", email);
    let response: ProfileResponse = client
        .patch_multipart(&path, update.into_form(), on_progress)
        .await?;

    client
        .session()
        .update_profile(
            response.user.clone(),
            response.profile.clone(),
            response.banner.clone(),
        )
        .map_err(|e| ApiError::local(format!("{:#}", e)))?;
    info!("Profile of {} updated", email);
    Ok(response)
}

/// Demo accounts keep their images on this machine as `data:` URLs.
#[tracing::instrument(skip(store, session, update))]
pub fn update_demo_profile<R: Runtime>(
    store: &DemoStore<R>,
    session: &SessionManager,
    update: ProfileUpdate,
) -> anyhow::Result<ProfileResponse> {
    if update.is_empty() {
        return Err(nothing_to_update().into());
    }

    let mut data = store.load()?;
    if update.remove_banner {
        data.banner = None;
    }
    if update.remove_profile {
        data.profile_image = None;
    }
    if let Some(file) = &update.banner {
        data.banner = Some(file.to_data_url());
    }
    if let Some(file) = &update.profile {
        data.profile_image = Some(file.to_data_url());
    }
    store.set_banner(data.banner.clone())?;
    store.set_profile_image(data.profile_image.clone())?;

    let user = session.user().map(|mut user| {
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        user.profile = data.profile_image.clone();
        user.banner = data.banner.clone();
        user
    });
    session.update_profile(user.clone(), data.profile_image.clone(), data.banner.clone())?;

    Ok(ProfileResponse {
        success: true,
        user,
        profile: data.profile_image,
        banner: data.banner,
    })
}
