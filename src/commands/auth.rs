use anyhow::Result;

use crate::{
    api,
    runtime::Runtime,
    validation::{validate_login_form, validate_signup_form},
};

use super::config::Config;
use super::report::{api_failure, form_failure};

/// Uses `given`, or asks for it on the terminal.
fn value_or_prompt<R: Runtime>(runtime: &R, given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(value) => Ok(value),
        None => runtime.read_line(prompt),
    }
}

#[tracing::instrument(skip(config, password))]
pub async fn login<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = value_or_prompt(&config.runtime, email, "Email")?;
    let password = value_or_prompt(&config.runtime, password, "Password")?;
    validate_login_form(email.trim(), &password).map_err(form_failure)?;

    let user = api::login(&config.client, &email, &password)
        .await
        .map_err(|e| api_failure(e, "Login"))?;
    println!("Logged in as {}", user.display_name());
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn demo<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let user = api::demo_login(&config.client)
        .await
        .map_err(|e| api_failure(e, "Demo login"))?;
    println!(
        "Logged in as {} (demo). Photos stay in {}",
        user.display_name(),
        config.demo_store().path().display()
    );
    Ok(())
}

#[tracing::instrument(skip(config, password))]
pub async fn signup<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let name = value_or_prompt(&config.runtime, name, "Name")?;
    let email = value_or_prompt(&config.runtime, email, "Email")?;
    let (password, confirmation) = match password {
        Some(password) => (password.clone(), password),
        None => (
            config.runtime.read_line("Password")?,
            config.runtime.read_line("Confirm password")?,
        ),
    };
    validate_signup_form(&name, email.trim(), &password, &confirmation).map_err(form_failure)?;

    let response = api::signup(&config.client, &name, &email, &password)
        .await
        .map_err(|e| api_failure(e, "Signup"))?;

    let created = response
        .email
        .clone()
        .or_else(|| response.user.as_ref().map(|u| u.email.clone()))
        .unwrap_or_else(|| api::auth::normalize_email(&email));
    if response.token.is_some() {
        println!("User {} created successfully! You are logged in.", created);
    } else {
        println!("User {} created successfully! Run `photoshelf login` to sign in.", created);
    }
    Ok(())
}

#[tracing::instrument(skip(config))]
pub fn logout<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    api::logout(&config.session)?;
    println!("Logged out");
    Ok(())
}

pub fn whoami<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let session = config.session.snapshot();
    match (&session.token, &session.user) {
        (Some(_), Some(user)) if session.is_authenticated() => {
            let mode = if session.is_demo { " (demo)" } else { "" };
            println!("{} <{}>{}", user.display_name(), user.email, mode);
        }
        (Some(_), _) => println!("Session expired. Run `photoshelf login` to sign in again."),
        _ => println!("Not logged in"),
    }
    Ok(())
}
