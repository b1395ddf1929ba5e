//! HTTP client for the photo service with auth, timeouts and retries.

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ApiError, ApiErrorKind, STATUS_NO_RESPONSE, log_error};
use super::retry::{RetryPolicy, with_retry};
use super::upload::{ProgressCallback, ProgressTracker, UploadForm};
use crate::session::{InvalidationReason, SessionManager};

/// Time allowed for an ordinary request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Time allowed for a multipart upload.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Per-call knobs for [`ApiClient`] requests.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Retry transient failures. Only honoured for GET.
    pub retry: bool,
    /// Attach the session token and check its expiry first.
    pub authenticated: bool,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Overrides the client's request timeout.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            retry: true,
            authenticated: true,
            headers: Vec::new(),
            query: Vec::new(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn no_retry(mut self) -> Self {
        self.retry = false;
        self
    }

    /// Sends the request without credentials, e.g. for login.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Single point of outbound communication with the photo service.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(client: Client, base_url: impl Into<String>, session: Arc<SessionManager>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session,
            retry_policy: RetryPolicy::default(),
            request_timeout: DEFAULT_TIMEOUT,
            upload_timeout: UPLOAD_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_timeouts(mut self, request: Duration, upload: Duration) -> Self {
        self.request_timeout = request;
        self.upload_timeout = upload;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET `path`. A 204 or empty body decodes from JSON `null`.
    #[tracing::instrument(skip(self, options))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn post<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.request(Method::POST, path, Some(body), options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn put<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.request(Method::PUT, path, Some(body), options).await
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None, options).await
    }

    /// POSTs a multipart form, reporting progress through `on_progress`.
    #[tracing::instrument(skip(self, form, on_progress))]
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        form: UploadForm,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T, ApiError> {
        self.send_multipart(Method::POST, path, form, on_progress).await
    }

    /// PATCHes a multipart form over the upload transport.
    #[tracing::instrument(skip(self, form, on_progress))]
    pub async fn patch_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: UploadForm,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T, ApiError> {
        self.send_multipart(Method::PATCH, path, form, on_progress).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        if options.authenticated {
            self.session
                .ensure_fresh()
                .inspect_err(|e| log_error(e, method.as_str(), path))?;
        }

        let url = self.url(path);
        let timeout = options.timeout.unwrap_or(self.request_timeout);
        debug!("{} {}...", method, url);

        let attempt = || self.send_json(&method, &url, body.as_deref(), &options, timeout);
        let result = if options.retry && method == Method::GET {
            let operation = format!("{} {}", method, path);
            with_retry(&self.retry_policy, &operation, attempt).await
        } else {
            attempt().await
        };

        let (status, value) = result.inspect_err(|e| log_error(e, method.as_str(), path))?;
        serde_json::from_value(value).map_err(|e| {
            let error = ApiError::unexpected_body(status, e);
            log_error(&error, method.as_str(), path);
            error
        })
    }

    /// One round trip, raced against `timeout`.
    async fn send_json(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        options: &RequestOptions,
        timeout: Duration,
    ) -> Result<(u16, Value), ApiError> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if options.authenticated {
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::from_transport(&e, timeout))?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ApiError::from_transport(&e, timeout))?;
            Ok::<_, ApiError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ApiError::timeout(timeout))??;

        let result = interpret(status, &bytes, "Request failed", false);
        if options.authenticated {
            self.drop_rejected_session(&result);
        }
        result
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: UploadForm,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T, ApiError> {
        self.session
            .ensure_fresh()
            .inspect_err(|e| log_error(e, method.as_str(), path))?;

        let url = self.url(path);
        debug!(
            "{} {} (multipart, {} file bytes)...",
            method,
            url,
            form.total_file_bytes()
        );

        let tracker =
            on_progress.map(|cb| Arc::new(ProgressTracker::new(form.total_file_bytes(), cb)));
        let timeout = self.upload_timeout;

        let result = async {
            let multipart = form.into_multipart(tracker.clone())?;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .timeout(timeout)
                .multipart(multipart);
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ApiError::from_transport(&e, timeout))?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ApiError::from_transport(&e, timeout))?;
            let interpreted = interpret(status, &bytes, "Upload failed", true);
            self.drop_rejected_session(&interpreted);
            let (_, value) = interpreted?;
            serde_json::from_value::<T>(value)
                .map_err(|e| ApiError::unexpected_body(status.as_u16(), e))
        }
        .await;

        match result {
            Ok(value) => {
                if let Some(tracker) = &tracker {
                    tracker.finish();
                }
                Ok(value)
            }
            Err(e) => {
                log_error(&e, method.as_str(), path);
                Err(e)
            }
        }
    }

    /// A 401 means the service no longer accepts the token.
    fn drop_rejected_session<T>(&self, result: &Result<T, ApiError>) {
        if let Err(error) = result {
            if error.status == StatusCode::UNAUTHORIZED.as_u16() {
                self.session.invalidate(InvalidationReason::Unauthorized);
            }
        }
    }
}

/// Decodes a response, or classifies it as a failure.
///
/// With `lenient`, a successful response that is not JSON is returned as a
/// JSON string.
fn interpret(
    status: StatusCode,
    body: &[u8],
    fallback: &str,
    lenient: bool,
) -> Result<(u16, Value), ApiError> {
    if !status.is_success() {
        return Err(ApiError::from_response(status, body, fallback));
    }
    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return Ok((status.as_u16(), Value::Null));
    }
    match serde_json::from_slice(body) {
        Ok(value) => Ok((status.as_u16(), value)),
        Err(_) if lenient => Ok((
            status.as_u16(),
            Value::String(String::from_utf8_lossy(body).into_owned()),
        )),
        Err(e) => Err(ApiError::unexpected_body(status.as_u16(), e)),
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(|e| {
        ApiError::new(
            ApiErrorKind::Unknown,
            STATUS_NO_RESPONSE,
            format!("Failed to encode request body: {}", e),
        )
    })
}
