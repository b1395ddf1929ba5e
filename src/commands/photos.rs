use anyhow::{Result, bail};
use log::debug;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::{
    api::{NewPhoto, PhotoService},
    domain::model::{LocalFile, Photo},
    http::{ApiError, ApiErrorKind, ProgressCallback},
    runtime::Runtime,
    validation::{FileRules, validate_file, validate_name},
};

use super::config::Config;
use super::report::{api_failure, field_failure};

/// Longest description echoed in listings before it is cut.
const LISTING_DESC_WIDTH: usize = 72;

#[tracing::instrument(skip(config))]
pub async fn list<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let user = config.require_user()?;
    let photos = config
        .photo_service()
        .list(&user.id)
        .await
        .map_err(|e| api_failure(e, "Loading photos"))?;

    if photos.is_empty() {
        println!("No photos yet. Upload one with `photoshelf upload <FILE>`.");
        return Ok(());
    }
    for (index, photo) in photos.iter().enumerate() {
        print_photo(index, photo);
    }
    Ok(())
}

fn print_photo(index: usize, photo: &Photo) {
    let mut title = photo.display_title();
    if title.trim().is_empty() {
        title = format!("Photo {}", index + 1);
    }
    let created = photo
        .created_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| photo.date_created.clone());
    let location = if photo.url.starts_with("data:") {
        "(stored on this machine)"
    } else {
        photo.url.as_str()
    };

    println!("{}  [{}]  {}", title, photo.id, created);
    println!("    {}", truncate(photo.display_desc(), LISTING_DESC_WIDTH));
    println!("    {}", location);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Draws a percentage on stderr, overwriting the previous one.
fn progress_printer() -> ProgressCallback {
    Arc::new(|percent| {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\rUploading... {:>5.1}%", percent);
        let _ = stderr.flush();
    })
}

#[tracing::instrument(skip(config))]
pub async fn upload<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    path: &Path,
    title: Option<String>,
    desc: Option<String>,
    quiet: bool,
) -> Result<()> {
    let user = config.require_user()?;
    let file = LocalFile::read(&config.runtime, path)?;
    validate_file(Some(&file), &FileRules::default()).map_err(field_failure)?;

    let photo = NewPhoto {
        file,
        title: title.unwrap_or_default(),
        desc: desc.unwrap_or_default(),
    };
    let progress = (!quiet).then(progress_printer);

    let result = config
        .photo_service()
        .upload(&user.id, photo, progress)
        .await;
    if !quiet {
        eprintln!();
    }
    let uploaded = result.map_err(|e| api_failure(e, "Upload"))?;

    println!("Uploaded {} [{}]", uploaded.display_title(), uploaded.id);
    Ok(())
}

async fn find_photo(service: &dyn PhotoService, user_id: &str, photo_id: &str) -> Result<Photo, ApiError> {
    let photos = service.list(user_id).await?;
    debug!("Looking for photo {} among {}", photo_id, photos.len());
    photos.into_iter().find(|p| p.id == photo_id).ok_or_else(|| {
        ApiError::new(
            ApiErrorKind::NotFound,
            404,
            format!("No photo with id {}", photo_id),
        )
    })
}

#[tracing::instrument(skip(config))]
pub async fn edit<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    photo_id: &str,
    title: Option<String>,
    desc: Option<String>,
) -> Result<()> {
    if title.is_none() && desc.is_none() {
        bail!("Nothing to change. Pass --title and/or --desc.");
    }
    if let Some(title) = &title {
        validate_name(title, "Title").map_err(field_failure)?;
    }

    let user = config.require_user()?;
    let service = config.photo_service();
    let photo = find_photo(service.as_ref(), &user.id, photo_id)
        .await
        .map_err(|e| api_failure(e, "Finding photo"))?;

    let title = title.unwrap_or_else(|| photo.title.clone());
    let desc = desc.unwrap_or_else(|| photo.desc.clone());
    let updated = service
        .edit(&user.id, &photo, title.trim(), desc.trim())
        .await
        .map_err(|e| api_failure(e, "Updating photo"))?;

    println!("Updated {} [{}]", updated.display_title(), updated.id);
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn delete<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    photo_id: &str,
    yes: bool,
) -> Result<()> {
    let user = config.require_user()?;
    let service = config.photo_service();
    let photo = find_photo(service.as_ref(), &user.id, photo_id)
        .await
        .map_err(|e| api_failure(e, "Finding photo"))?;

    if !yes {
        let prompt = format!("Delete \"{}\"?", photo.display_title());
        if !config.runtime.confirm(&prompt)? {
            println!("Aborted");
            return Ok(());
        }
    }

    service
        .delete(&user.id, &photo)
        .await
        .map_err(|e| api_failure(e, "Deleting photo"))?;
    println!("Deleted {} [{}]", photo.display_title(), photo.id);
    Ok(())
}
