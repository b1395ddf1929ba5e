use log::info;
use serde::{Deserialize, Serialize};

use crate::http::{ApiClient, ApiError, ApiErrorKind, RequestOptions};

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Posts a feedback message. Every field must be non-blank.
#[tracing::instrument(skip(client, message))]
pub async fn send_feedback(
    client: &ApiClient,
    name: &str,
    email: &str,
    message: &str,
) -> Result<FeedbackResponse, ApiError> {
    let missing: Vec<String> = [("name", name), ("email", email), ("message", message)]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }

    let body = FeedbackRequest {
        name: name.trim(),
        email: email.trim(),
        message: message.trim(),
    };
    let response: FeedbackResponse = client
        .post("/api/feedback", &body, RequestOptions::default())
        .await?;

    if !response.success {
        return Err(ApiError::new(
            ApiErrorKind::Unknown,
            200,
            response
                .message
                .clone()
                .unwrap_or_else(|| "Feedback was not accepted".to_string()),
        ));
    }
    info!("Feedback sent");
    Ok(response)
}
