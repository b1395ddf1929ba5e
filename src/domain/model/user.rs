use serde::{Deserialize, Serialize};

/// An account on the photo service.
///
/// The service sends ids as numbers while demo sessions use strings, so the
/// id is kept as a string either way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    #[serde(deserialize_with = "super::id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Avatar image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Banner image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl User {
    /// Name to greet the user with, falling back to the email address.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_id() {
        let user: User =
            serde_json::from_str(r#"{"id": 7, "name": "Ada", "email": "ada@example.com"}"#)
                .unwrap();
        assert_eq!(user.id, "7");
        assert_eq!(user.profile, None);
    }

    #[test]
    fn test_deserialize_string_id_with_images() {
        let user: User = serde_json::from_str(
            r#"{"id": "u-1", "name": "Ada", "email": "a@b.co", "profile": "p.png", "banner": "b.png"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.profile.as_deref(), Some("p.png"));
        assert_eq!(user.banner.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_display_name_fallback() {
        let user = User {
            id: "1".to_string(),
            name: " ".to_string(),
            email: "a@b.co".to_string(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "a@b.co");
    }
}
