use anyhow::anyhow;

use crate::http::ApiError;
use crate::validation::{FormErrors, ValidationError};

const LOGIN_HINT: &str = "Run `photoshelf login` to sign in again.";

/// Wraps a classified failure with the message users are shown for its code.
pub(crate) fn api_failure(error: ApiError, action: &str) -> anyhow::Error {
    let mut summary = format!("{} failed. {}", action, error.user_message());
    if error.is_auth_error() {
        summary.push(' ');
        summary.push_str(LOGIN_HINT);
    }
    anyhow::Error::new(error).context(summary)
}

pub(crate) fn form_failure(errors: FormErrors) -> anyhow::Error {
    let lines: Vec<String> = errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field, message))
        .collect();
    anyhow!("Please correct the errors below.\n{}", lines.join("\n"))
}

pub(crate) fn field_failure(error: ValidationError) -> anyhow::Error {
    anyhow!("{}: {}", error.field, error.message)
}
