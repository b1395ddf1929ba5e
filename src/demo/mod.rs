//! Local storage backing demo mode.
//!
//! Demo accounts never send photos to the service. Everything lives in
//! `<state-dir>/demo.json`, which outlives the session so a later demo login
//! finds the same gallery.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::model::{LocalFile, Photo, sort_newest_first};
use crate::runtime::{Runtime, write_atomic};

pub const DEMO_FILE: &str = "demo.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DemoData {
    #[serde(default, rename = "demoPhotos")]
    pub photos: Vec<Photo>,
    #[serde(default, rename = "demoProfileImage")]
    pub profile_image: Option<String>,
    #[serde(default, rename = "demoBanner")]
    pub banner: Option<String>,
}

pub struct DemoStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
    cache: Mutex<Option<DemoData>>,
}

impl<R: Runtime> DemoStore<R> {
    pub fn new(runtime: R, state_dir: &Path) -> Self {
        Self {
            runtime,
            path: state_dir.join(DEMO_FILE),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Option<DemoData>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_file(&self) -> Result<DemoData> {
        if !self.runtime.exists(&self.path) {
            debug!("No demo data at {:?}", self.path);
            return Ok(DemoData::default());
        }
        let content = self.runtime.read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse demo data {:?}", self.path))
    }

    fn write_file(&self, data: &DemoData) -> Result<()> {
        let json = serde_json::to_vec_pretty(data)?;
        write_atomic(&self.runtime, &self.path, &json)
            .with_context(|| format!("Failed to save demo data to {:?}", self.path))
    }

    /// Applies `change` to a copy of the stored data and keeps it once written.
    fn update<T>(&self, change: impl FnOnce(&mut DemoData) -> T) -> Result<T> {
        let mut cache = self.lock();
        let mut data = match cache.as_ref() {
            Some(data) => data.clone(),
            None => self.read_file()?,
        };
        let out = change(&mut data);
        self.write_file(&data)?;
        *cache = Some(data);
        Ok(out)
    }

    pub fn load(&self) -> Result<DemoData> {
        let mut cache = self.lock();
        if let Some(data) = cache.as_ref() {
            return Ok(data.clone());
        }
        let data = self.read_file()?;
        *cache = Some(data.clone());
        Ok(data)
    }

    /// Stored photos, newest first.
    pub fn photos(&self) -> Result<Vec<Photo>> {
        let mut photos = self.load()?.photos;
        sort_newest_first(&mut photos);
        Ok(photos)
    }

    /// Stores `file` inline as a `data:` URL.
    #[tracing::instrument(skip(self, file))]
    pub fn add_photo(&self, file: &LocalFile, title: &str, desc: &str) -> Result<Photo> {
        let id = Uuid::new_v4().to_string();
        let title = if title.trim().is_empty() {
            file.file_name.clone()
        } else {
            title.to_string()
        };
        let photo = Photo {
            photo_key: format!("demo/{}", id),
            id,
            url: file.to_data_url(),
            title,
            desc: desc.to_string(),
            date_created: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        self.update(|data| data.photos.push(photo.clone()))?;
        info!("Stored demo photo {} ({} bytes)", photo.id, file.size());
        Ok(photo)
    }

    /// Changes title and description; `None` if no photo has that id.
    pub fn edit_photo(&self, id: &str, title: &str, desc: &str) -> Result<Option<Photo>> {
        self.update(|data| {
            let photo = data.photos.iter_mut().find(|p| p.id == id)?;
            photo.title = title.to_string();
            photo.desc = desc.to_string();
            Some(photo.clone())
        })
    }

    /// Returns false if no photo has that id.
    pub fn delete_photo(&self, id: &str) -> Result<bool> {
        self.update(|data| {
            let before = data.photos.len();
            data.photos.retain(|p| p.id != id);
            data.photos.len() != before
        })
    }

    pub fn set_profile_image(&self, image: Option<String>) -> Result<()> {
        self.update(|data| data.profile_image = image)
    }

    pub fn set_banner(&self, banner: Option<String>) -> Result<()> {
        self.update(|data| data.banner = banner)
    }
}
