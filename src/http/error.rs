//! Error taxonomy for calls against the photo service.
//!
//! Every failed request ends up as an [`ApiError`]. The [`ErrorCode`] set is
//! closed; each code owns exactly one user-facing message so the wording shown
//! to users never depends on the call site.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Status reported for failures that never produced a response.
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Status reported when the client gave up waiting.
pub const STATUS_CLIENT_TIMEOUT: u16 = 408;

/// Flat error codes, one per [`ApiErrorKind`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NetworkError,
    Timeout,
    Unauthorized,
    TokenExpired,
    InvalidCredentials,
    ValidationError,
    MissingFields,
    ServerError,
    ServiceUnavailable,
    NotFound,
    Conflict,
    RateLimit,
    Unknown,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 13] = [
        ErrorCode::NetworkError,
        ErrorCode::Timeout,
        ErrorCode::Unauthorized,
        ErrorCode::TokenExpired,
        ErrorCode::InvalidCredentials,
        ErrorCode::ValidationError,
        ErrorCode::MissingFields,
        ErrorCode::ServerError,
        ErrorCode::ServiceUnavailable,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::RateLimit,
        ErrorCode::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::MissingFields => "MISSING_FIELDS",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// The fixed message shown to users for this code.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCode::NetworkError => {
                "Unable to connect to the server. Please check your internet connection."
            }
            ErrorCode::Timeout => "Request timed out. Please try again.",
            ErrorCode::Unauthorized | ErrorCode::TokenExpired => {
                "Your session has expired. Please log in again."
            }
            ErrorCode::InvalidCredentials => "Invalid email or password.",
            ErrorCode::ValidationError => "Please check your input and try again.",
            ErrorCode::MissingFields => "Please fill in all required fields.",
            ErrorCode::ServerError => "Something went wrong on our end. Please try again later.",
            ErrorCode::ServiceUnavailable => {
                "Service is temporarily unavailable. Please try again later."
            }
            ErrorCode::NotFound => "The requested resource was not found.",
            ErrorCode::Conflict => "This resource already exists.",
            ErrorCode::RateLimit => "Too many requests. Please wait a moment and try again.",
            ErrorCode::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong, with whatever structured data that kind of failure carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiErrorKind {
    /// No response was received (DNS failure, refused connection, offline).
    Network { cause: String },
    /// The client aborted after `after`, or the gateway reported 504 (`after` is `None`).
    Timeout { after: Option<Duration> },
    Unauthorized,
    TokenExpired,
    InvalidCredentials,
    Validation,
    MissingFields { fields: Vec<String> },
    Server,
    ServiceUnavailable,
    NotFound,
    Conflict,
    RateLimit { retry_after: Option<Duration> },
    Unknown,
}

impl ApiErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiErrorKind::Network { .. } => ErrorCode::NetworkError,
            ApiErrorKind::Timeout { .. } => ErrorCode::Timeout,
            ApiErrorKind::Unauthorized => ErrorCode::Unauthorized,
            ApiErrorKind::TokenExpired => ErrorCode::TokenExpired,
            ApiErrorKind::InvalidCredentials => ErrorCode::InvalidCredentials,
            ApiErrorKind::Validation => ErrorCode::ValidationError,
            ApiErrorKind::MissingFields { .. } => ErrorCode::MissingFields,
            ApiErrorKind::Server => ErrorCode::ServerError,
            ApiErrorKind::ServiceUnavailable => ErrorCode::ServiceUnavailable,
            ApiErrorKind::NotFound => ErrorCode::NotFound,
            ApiErrorKind::Conflict => ErrorCode::Conflict,
            ApiErrorKind::RateLimit { .. } => ErrorCode::RateLimit,
            ApiErrorKind::Unknown => ErrorCode::Unknown,
        }
    }

    /// Maps an HTTP status to its error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::Validation,
            401 | 403 => ApiErrorKind::Unauthorized,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            429 => ApiErrorKind::RateLimit { retry_after: None },
            500 | 502 | 503 => ApiErrorKind::Server,
            504 => ApiErrorKind::Timeout { after: None },
            _ => ApiErrorKind::Unknown,
        }
    }
}

/// A classified failure of a call against the photo service.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// The fixed message for this error's code.
    pub fn user_message(&self) -> &'static str {
        self.code().user_message()
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::Unauthorized | ErrorCode::TokenExpired
        )
    }

    pub fn network(cause: impl fmt::Display) -> Self {
        let cause = cause.to_string();
        Self::new(
            ApiErrorKind::Network {
                cause: cause.clone(),
            },
            STATUS_NO_RESPONSE,
            ErrorCode::NetworkError.user_message(),
        )
        .with_details(Value::String(cause))
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ApiErrorKind::Timeout { after: Some(after) },
            STATUS_CLIENT_TIMEOUT,
            ErrorCode::Timeout.user_message(),
        )
    }

    pub fn token_expired() -> Self {
        Self::new(
            ApiErrorKind::TokenExpired,
            StatusCode::UNAUTHORIZED.as_u16(),
            ErrorCode::TokenExpired.user_message(),
        )
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::new(
            ApiErrorKind::MissingFields { fields },
            StatusCode::BAD_REQUEST.as_u16(),
            ErrorCode::MissingFields.user_message(),
        )
    }

    /// A failure on this side of the wire, such as an unwritable state file.
    pub fn local(cause: impl fmt::Display) -> Self {
        Self::new(ApiErrorKind::Unknown, STATUS_NO_RESPONSE, cause.to_string())
    }

    /// A 2xx response whose body could not be decoded into the expected type.
    pub fn unexpected_body(status: u16, cause: impl fmt::Display) -> Self {
        Self::new(
            ApiErrorKind::Unknown,
            status,
            format!("Unexpected response body: {}", cause),
        )
    }

    /// Converts a transport failure reported by reqwest.
    pub fn from_transport(error: &reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self::timeout(timeout);
        }
        if error.is_builder() {
            return Self::new(
                ApiErrorKind::Unknown,
                STATUS_NO_RESPONSE,
                format!("Invalid request: {}", error),
            );
        }
        Self::network(error)
    }

    /// Builds an error from a non-success response status and raw body.
    ///
    /// The message is taken from the JSON body's `message` or `error` field,
    /// falling back to the status reason phrase, then `fallback`.
    pub fn from_response(status: StatusCode, body: &[u8], fallback: &str) -> Self {
        let details: Option<Value> = serde_json::from_slice(body).ok();

        let from_body = details.as_ref().and_then(|d| {
            ["message", "error"]
                .iter()
                .find_map(|key| d.get(*key).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        let message = from_body
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());

        let mut kind = ApiErrorKind::from_status(status.as_u16());
        if let ApiErrorKind::RateLimit { retry_after } = &mut kind {
            *retry_after = details
                .as_ref()
                .and_then(|d| d.get("retryAfter"))
                .and_then(Value::as_u64)
                .map(Duration::from_secs);
        }

        Self {
            kind,
            status: status.as_u16(),
            message,
            details,
            timestamp: Utc::now(),
        }
    }

    /// Network failures, client-side timeouts, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ApiErrorKind::Network { .. } => true,
            ApiErrorKind::Timeout { after: Some(_) } => true,
            _ => self.status >= 500 || self.status == StatusCode::TOO_MANY_REQUESTS.as_u16(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, status {})",
            self.message,
            self.code(),
            self.status
        )
    }
}

impl std::error::Error for ApiError {}

/// Records a failed call for debugging.
pub fn log_error(error: &ApiError, method: &str, path: &str) {
    log::warn!(
        "{} {} failed: code={} status={} message={:?} at {}",
        method,
        path,
        error.code(),
        error.status,
        error.message,
        error.timestamp.to_rfc3339()
    );
    if let Some(details) = &error.details {
        log::debug!("{} {} error details: {}", method, path, details);
    }
}
