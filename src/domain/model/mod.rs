pub mod file;
pub mod photo;
pub mod user;

pub use file::*;
pub use photo::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Accepts ids sent either as JSON numbers or strings.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(i64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}

/// Treats a JSON `null` like an empty string.
pub(crate) fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
