//! Transport layer: requests, errors, retries and uploads.

mod client;
pub mod error;
pub mod retry;
pub mod token;
pub mod upload;

pub use client::{ApiClient, DEFAULT_TIMEOUT, RequestOptions, UPLOAD_TIMEOUT};
pub use error::{ApiError, ApiErrorKind, ErrorCode, log_error};
pub use retry::{RetryPolicy, with_retry};
pub use token::is_token_expired;
pub use upload::{FilePart, ProgressCallback, UploadForm};
