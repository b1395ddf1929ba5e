use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::demo::DemoStore;
use crate::domain::model::{LocalFile, Photo, PhotoList, UploadedPhoto, sort_newest_first};
use crate::http::{
    ApiClient, ApiError, ApiErrorKind, ErrorCode, ProgressCallback, RequestOptions, UploadForm,
};
use crate::runtime::Runtime;

/// A photo about to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub file: LocalFile,
    pub title: String,
    pub desc: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Photos of `user_id`, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Photo>, ApiError>;

    async fn upload(
        &self,
        user_id: &str,
        photo: NewPhoto,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Photo, ApiError>;

    /// Returns the photo with its new title and description.
    async fn edit(
        &self,
        user_id: &str,
        photo: &Photo,
        title: &str,
        desc: &str,
    ) -> Result<Photo, ApiError>;

    async fn delete(&self, user_id: &str, photo: &Photo) -> Result<(), ApiError>;
}

/// Photos kept by the service.
pub struct RemotePhotos {
    client: ApiClient,
}

impl RemotePhotos {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EditRequest<'a> {
    user_id: &'a str,
    title: &'a str,
    desc: &'a str,
}

#[async_trait]
impl PhotoService for RemotePhotos {
    #[tracing::instrument(skip(self))]
    async fn list(&self, user_id: &str) -> Result<Vec<Photo>, ApiError> {
        let path = format!("/api/images/user/{}", user_id);
        let mut photos = self
            .client
            .get::<PhotoList>(&path, RequestOptions::default())
            .await?
            .images;
        sort_newest_first(&mut photos);
        debug!("Fetched {} photos", photos.len());
        Ok(photos)
    }

    #[tracing::instrument(skip(self, photo, on_progress))]
    async fn upload(
        &self,
        user_id: &str,
        photo: NewPhoto,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Photo, ApiError> {
        let form = UploadForm::new()
            .file(
                "file",
                photo.file.file_name,
                photo.file.mime,
                photo.file.bytes,
            )
            .text("userId", user_id)
            .text("title", photo.title)
            .text("desc", photo.desc);

        let uploaded: UploadedPhoto = self
            .client
            .upload_file("/api/upload/image", form, on_progress)
            .await?;
        info!("Uploaded photo {}", uploaded.photo.id);
        Ok(uploaded.photo)
    }

    #[tracing::instrument(skip(self, photo))]
    async fn edit(
        &self,
        user_id: &str,
        photo: &Photo,
        title: &str,
        desc: &str,
    ) -> Result<Photo, ApiError> {
        let path = format!("/api/edit/{}", photo.id);
        let body = EditRequest {
            user_id,
            title,
            desc,
        };
        let response: Value = self.client.put(&path, &body, RequestOptions::default()).await?;

        // The service may echo the record or answer with a bare status.
        let updated = serde_json::from_value::<Photo>(response)
            .ok()
            .filter(|p| p.id == photo.id)
            .unwrap_or_else(|| Photo {
                title: title.to_string(),
                desc: desc.to_string(),
                ..photo.clone()
            });
        Ok(updated)
    }

    #[tracing::instrument(skip(self, photo))]
    async fn delete(&self, user_id: &str, photo: &Photo) -> Result<(), ApiError> {
        let options = RequestOptions::default()
            .query("userId", user_id)
            .query("photoId", photo.id.as_str())
            .query("photoKey", photo.photo_key.as_str());
        self.client.delete::<Value>("/api/delete", options).await?;
        info!("Deleted photo {}", photo.id);
        Ok(())
    }
}

/// Photos of a demo session, kept on this machine.
pub struct DemoPhotos<R: Runtime> {
    store: DemoStore<R>,
}

impl<R: Runtime> DemoPhotos<R> {
    pub fn new(store: DemoStore<R>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DemoStore<R> {
        &self.store
    }
}

fn storage_error(error: anyhow::Error) -> ApiError {
    ApiError::local(format!("{:#}", error))
}

fn no_such_photo(id: &str) -> ApiError {
    ApiError::new(
        ApiErrorKind::NotFound,
        404,
        format!("{} ({})", ErrorCode::NotFound.user_message(), id),
    )
}

#[async_trait]
impl<R: Runtime> PhotoService for DemoPhotos<R> {
    async fn list(&self, _user_id: &str) -> Result<Vec<Photo>, ApiError> {
        self.store.photos().map_err(storage_error)
    }

    async fn upload(
        &self,
        _user_id: &str,
        photo: NewPhoto,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Photo, ApiError> {
        let stored = self
            .store
            .add_photo(&photo.file, &photo.title, &photo.desc)
            .map_err(storage_error)?;
        if let Some(on_progress) = on_progress {
            on_progress(100.0);
        }
        Ok(stored)
    }

    async fn edit(
        &self,
        _user_id: &str,
        photo: &Photo,
        title: &str,
        desc: &str,
    ) -> Result<Photo, ApiError> {
        self.store
            .edit_photo(&photo.id, title, desc)
            .map_err(storage_error)?
            .ok_or_else(|| no_such_photo(&photo.id))
    }

    async fn delete(&self, _user_id: &str, photo: &Photo) -> Result<(), ApiError> {
        if self.store.delete_photo(&photo.id).map_err(storage_error)? {
            Ok(())
        } else {
            Err(no_such_photo(&photo.id))
        }
    }
}
