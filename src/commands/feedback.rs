use anyhow::Result;

use crate::{api, runtime::Runtime, validation::validate_email};

use super::config::Config;
use super::report::{api_failure, field_failure};

/// Sends feedback, filling in name and email from the session when omitted.
#[tracing::instrument(skip(config, message))]
pub async fn feedback<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    name: Option<String>,
    email: Option<String>,
    message: String,
) -> Result<()> {
    let user = config.session.user();
    let name = name
        .or_else(|| user.as_ref().map(|u| u.name.clone()))
        .unwrap_or_default();
    let email = email
        .or_else(|| user.as_ref().map(|u| u.email.clone()))
        .unwrap_or_default();
    if !email.trim().is_empty() {
        validate_email(email.trim()).map_err(field_failure)?;
    }

    api::send_feedback(&config.client, &name, &email, &message)
        .await
        .map_err(|e| api_failure(e, "Sending feedback"))?;
    println!("Thanks for your feedback!");
    Ok(())
}
