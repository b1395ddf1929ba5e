//! Input checks run before anything is sent to the service.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::model::LocalFile;

/// Largest accepted upload, in bytes.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Minimum password length on signup.
pub const SIGNUP_PASSWORD_MIN: usize = 6;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field name to message, for checks that look at a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn record(&mut self, field: &str, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.0.insert(field.to_string(), e.message);
        }
    }

    /// `Ok` if nothing was recorded.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if !looks_like_email(email) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address",
        ));
    }
    Ok(())
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordRules {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_number: bool,
    pub require_special: bool,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 1,
            require_uppercase: false,
            require_lowercase: false,
            require_number: false,
            require_special: false,
        }
    }
}

pub fn validate_password(password: &str, rules: &PasswordRules) -> Result<(), ValidationError> {
    let fail = |message: String| Err(ValidationError::new("password", message));

    if password.trim().is_empty() {
        return fail("Password is required".to_string());
    }
    if password.chars().count() < rules.min_length {
        return fail(format!(
            "Password must be at least {} characters long",
            rules.min_length
        ));
    }
    if rules.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return fail("Password must contain at least one uppercase letter".to_string());
    }
    if rules.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return fail("Password must contain at least one lowercase letter".to_string());
    }
    if rules.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
        return fail("Password must contain at least one number".to_string());
    }
    if rules.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return fail("Password must contain at least one special character".to_string());
    }
    Ok(())
}

/// Checks a 2 to 50 character name. `label` is used in messages, e.g. "Name".
pub fn validate_name(name: &str, label: &str) -> Result<(), ValidationError> {
    let field = label.to_lowercase();
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if trimmed.is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", label)));
    }
    if length < NAME_MIN {
        return Err(ValidationError::new(
            field,
            format!("{} must be at least {} characters long", label, NAME_MIN),
        ));
    }
    if length > NAME_MAX {
        return Err(ValidationError::new(
            field,
            format!("{} must be less than {} characters", label, NAME_MAX),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct FileRules {
    pub max_size: u64,
    pub allowed_types: Vec<String>,
    pub label: String,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            max_size: MAX_FILE_SIZE,
            allowed_types: ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            label: "File".to_string(),
        }
    }
}

pub fn validate_file(file: Option<&LocalFile>, rules: &FileRules) -> Result<(), ValidationError> {
    let Some(file) = file else {
        return Err(ValidationError::new(
            "file",
            format!("{} is required", rules.label),
        ));
    };

    if file.size() > rules.max_size {
        let max_mb = rules.max_size as f64 / (1024.0 * 1024.0);
        return Err(ValidationError::new(
            "file",
            format!("{} size must be less than {:.1}MB", rules.label, max_mb),
        ));
    }

    if !rules.allowed_types.iter().any(|t| *t == file.mime) {
        let types: Vec<String> = rules
            .allowed_types
            .iter()
            .map(|t| t.rsplit('/').next().unwrap_or(t.as_str()).to_uppercase())
            .collect();
        return Err(ValidationError::new(
            "file",
            format!("{} must be one of: {}", rules.label, types.join(", ")),
        ));
    }
    Ok(())
}

pub fn validate_login_form(email: &str, password: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    errors.record("email", validate_email(email));
    errors.record(
        "password",
        validate_password(password, &PasswordRules::default()),
    );
    errors.into_result()
}

pub fn validate_signup_form(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    errors.record("name", validate_name(name, "Name"));
    errors.record("email", validate_email(email));
    errors.record(
        "password",
        validate_password(
            password,
            &PasswordRules {
                min_length: SIGNUP_PASSWORD_MIN,
                ..Default::default()
            },
        ),
    );
    if password != confirm_password {
        errors.record(
            "confirmPassword",
            Err(ValidationError::new(
                "confirmPassword",
                "Passwords do not match",
            )),
        );
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());

        let err = validate_email("   ").unwrap_err();
        assert_eq!(err.field, "email");
        assert_eq!(err.message, "Email is required");

        for bad in ["ada", "ada@", "@example.com", "ada@example", "a da@x.com", "a@b@c.com", "a@.com", "a@b."] {
            assert_eq!(
                validate_email(bad).unwrap_err().message,
                "Please enter a valid email address",
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_validate_password_rules() {
        let defaults = PasswordRules::default();
        assert!(validate_password("x", &defaults).is_ok());
        assert_eq!(
            validate_password(" ", &defaults).unwrap_err().message,
            "Password is required"
        );

        let strict = PasswordRules {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_number: true,
            require_special: true,
        };
        assert_eq!(
            validate_password("short", &strict).unwrap_err().message,
            "Password must be at least 8 characters long"
        );
        assert!(validate_password("lowercase1!", &strict)
            .unwrap_err()
            .message
            .contains("uppercase"));
        assert!(validate_password("UPPERCASE1!", &strict)
            .unwrap_err()
            .message
            .contains("lowercase"));
        assert!(validate_password("NoNumbers!", &strict)
            .unwrap_err()
            .message
            .contains("number"));
        assert!(validate_password("NoSpecial1", &strict)
            .unwrap_err()
            .message
            .contains("special"));
        assert!(validate_password("Valid1Pass!", &strict).is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Al", "Name").is_ok());

        let err = validate_name("", "Name").unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "Name is required");

        assert_eq!(
            validate_name(" A ", "Name").unwrap_err().message,
            "Name must be at least 2 characters long"
        );
        assert_eq!(
            validate_name(&"x".repeat(51), "Title").unwrap_err().message,
            "Title must be less than 50 characters"
        );
    }

    #[test]
    fn test_validate_file() {
        let rules = FileRules::default();
        let ok = LocalFile::new("a.png", "image/png", vec![0; 10]);
        assert!(validate_file(Some(&ok), &rules).is_ok());

        assert_eq!(
            validate_file(None, &rules).unwrap_err().message,
            "File is required"
        );

        let big = LocalFile::new("a.png", "image/png", vec![0; (MAX_FILE_SIZE + 1) as usize]);
        assert_eq!(
            validate_file(Some(&big), &rules).unwrap_err().message,
            "File size must be less than 10.0MB"
        );

        let text = LocalFile::new("a.txt", "text/plain", vec![0; 10]);
        assert_eq!(
            validate_file(Some(&text), &rules).unwrap_err().message,
            "File must be one of: JPEG, PNG, GIF, WEBP"
        );
    }

    #[test]
    fn test_validate_login_form() {
        assert!(validate_login_form("ada@example.com", "pw").is_ok());

        let errors = validate_login_form("nope", "").unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn test_validate_signup_form() {
        assert!(validate_signup_form("Ada", "ada@example.com", "secret", "secret").is_ok());

        let errors = validate_signup_form("A", "ada@example.com", "short", "other").unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some("Name must be at least 2 characters long")
        );
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters long")
        );
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
        assert_eq!(errors.get("email"), None);
        assert_eq!(errors.iter().count(), 3);
    }
}
