use log::info;
use serde::{Deserialize, Serialize};

use crate::domain::model::User;
use crate::http::{ApiClient, ApiError, ApiErrorKind, ErrorCode, RequestOptions};
use crate::session::SessionManager;

pub const DEMO_EMAIL: &str = "demo@demo.com";
pub const DEMO_PASSWORD: &str = "demo";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct SignupResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Emails are compared case-insensitively by the service.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[tracing::instrument(skip(client, password))]
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<User, ApiError> {
    login_as(client, email, password, false).await
}

/// Signs in to the shared demo account. Photos then stay on this machine.
#[tracing::instrument(skip(client))]
pub async fn demo_login(client: &ApiClient) -> Result<User, ApiError> {
    login_as(client, DEMO_EMAIL, DEMO_PASSWORD, true).await
}

async fn login_as(
    client: &ApiClient,
    email: &str,
    password: &str,
    is_demo: bool,
) -> Result<User, ApiError> {
    let email = normalize_email(email);
    let response: LoginResponse = client
        .post(
            "/api/login",
            &Credentials {
                email: &email,
                password,
            },
            RequestOptions::default().anonymous(),
        )
        .await
        .map_err(reject_credentials)?;

    client
        .session()
        .establish(response.token, response.user.clone(), is_demo)
        .map_err(|e| ApiError::local(format!("{:#}", e)))?;
    Ok(response.user)
}

/// On the login endpoint a 401 means the email or password is wrong.
fn reject_credentials(error: ApiError) -> ApiError {
    if error.status != 401 {
        return error;
    }
    ApiError {
        kind: ApiErrorKind::InvalidCredentials,
        message: ErrorCode::InvalidCredentials.user_message().to_string(),
        ..error
    }
}

/// Creates an account, signing in right away if the service hands out a token.
#[tracing::instrument(skip(client, password))]
pub async fn signup(
    client: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
) -> Result<SignupResponse, ApiError> {
    let email = normalize_email(email);
    let response: SignupResponse = client
        .post(
            "/api/signup",
            &SignupRequest {
                email: &email,
                password,
                name: name.trim(),
            },
            RequestOptions::default().anonymous(),
        )
        .await?;

    if let Some(token) = &response.token {
        let user = response.user.clone().unwrap_or_else(|| User {
            name: name.trim().to_string(),
            email: response.email.clone().unwrap_or_else(|| email.clone()),
            ..Default::default()
        });
        client
            .session()
            .establish(token.clone(), user, false)
            .map_err(|e| ApiError::local(format!("{:#}", e)))?;
    } else {
        info!("Account {} created; log in to continue", email);
    }
    Ok(response)
}

/// Ends the session. Demo photos are already on disk and stay there for the
/// next demo login.
#[tracing::instrument(skip(session))]
pub fn logout(session: &SessionManager) -> anyhow::Result<()> {
    session.logout()?;
    info!("Logged out");
    Ok(())
}
