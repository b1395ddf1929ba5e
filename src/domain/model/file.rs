use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::runtime::Runtime;

/// A file picked from the local disk for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads `path`, guessing the content type from its extension.
    pub fn read<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Self> {
        let bytes = runtime
            .read(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_for_path(path).unwrap_or("application/octet-stream");
        Ok(Self::new(file_name, mime, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Inline `data:` URL of the contents.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Content type of the image formats the service accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
