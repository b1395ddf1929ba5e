//! Multipart forms whose file parts report upload progress.

use futures_util::stream;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::error::{ApiError, ApiErrorKind, STATUS_NO_RESPONSE};

/// Size of the pieces a file part is streamed in.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Receives the percentage of file bytes handed to the transport so far.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Text fields and files of a multipart request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    texts: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.texts.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        });
        self
    }

    pub fn texts(&self) -> &[(String, String)] {
        &self.texts
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn total_file_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes.len() as u64).sum()
    }

    pub(crate) fn into_multipart(
        self,
        tracker: Option<Arc<ProgressTracker>>,
    ) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in self.texts {
            form = form.text(name, value);
        }

        for file in self.files {
            let length = file.bytes.len() as u64;
            let chunks: Vec<Vec<u8>> = file.bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
            let tracker = tracker.clone();
            let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
                if let Some(tracker) = &tracker {
                    tracker.advance(chunk.len() as u64);
                }
                Ok::<_, std::io::Error>(chunk)
            }));

            let part = Part::stream_with_length(Body::wrap_stream(body_stream), length)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|e| {
                    ApiError::new(
                        ApiErrorKind::Unknown,
                        STATUS_NO_RESPONSE,
                        format!("Invalid content type '{}': {}", file.mime, e),
                    )
                })?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// Turns byte counts into monotonically non-decreasing percentages.
pub struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    last_reported: Mutex<f64>,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last_reported: Mutex::new(0.0),
            callback,
        }
    }

    pub fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        if self.total == 0 {
            return;
        }
        let percent = (sent.min(self.total) as f64 / self.total as f64) * 100.0;
        self.report(percent);
    }

    /// Reports 100% unless that was already reported.
    pub fn finish(&self) {
        self.report(100.0);
    }

    fn report(&self, percent: f64) {
        {
            let mut last = self.last_reported.lock().unwrap_or_else(|e| e.into_inner());
            if percent <= *last && *last > 0.0 {
                return;
            }
            *last = percent;
        }
        (self.callback)(percent);
    }
}
