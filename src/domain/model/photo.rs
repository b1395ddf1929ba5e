use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Description shown for photos uploaded without one.
pub const DEFAULT_DESCRIPTION: &str = "Uploaded by you";

/// A stored photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(deserialize_with = "super::id_from_string_or_number")]
    pub id: String,
    /// Opaque storage key, needed to delete the photo
    #[serde(default)]
    pub photo_key: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "super::string_or_null")]
    pub desc: String,
    /// Creation time as sent by the service (RFC 3339, or naive UTC)
    #[serde(default)]
    pub date_created: String,
}

impl Photo {
    /// Parsed creation time; `None` when the service sent something unreadable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date_created)
    }

    /// Title cleaned up for display.
    pub fn display_title(&self) -> String {
        clean_title(&self.title)
    }

    pub fn display_desc(&self) -> &str {
        if self.desc.trim().is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.desc
        }
    }
}

/// Response of `GET /api/images/user/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhotoList {
    #[serde(default)]
    pub images: Vec<Photo>,
}

/// Response of `POST /api/upload/image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedPhoto {
    pub photo: Photo,
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Orders photos newest first. Photos with unreadable timestamps go last.
pub fn sort_newest_first(photos: &mut [Photo]) {
    photos.sort_by(|a, b| match (a.created_at(), b.created_at()) {
        (Some(at_a), Some(at_b)) => at_b.cmp(&at_a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.date_created.cmp(&a.date_created),
    });
}

/// Turns a stored file name into a display title.
///
/// `1699999999_summer-trip_day_1.jpg` becomes `Summer Trip Day 1`: the upload
/// prefix before the first `_` and the extension are dropped, separators
/// become spaces, and each word is capitalised.
pub fn clean_title(file_name: &str) -> String {
    let name = match file_name.split_once('_') {
        Some((_, rest)) => rest,
        None => file_name,
    };
    let name = match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => name,
    };
    let spaced = name.replace(['_', '-'], " ");

    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, date: &str) -> Photo {
        Photo {
            id: id.to_string(),
            photo_key: format!("key-{}", id),
            url: format!("https://cdn.example.com/{}.jpg", id),
            title: format!("{}.jpg", id),
            desc: String::new(),
            date_created: date.to_string(),
        }
    }

    #[test]
    fn test_deserialize_service_photo() {
        let json = r#"{
            "id": 12,
            "photoKey": "users/3/abc.jpg",
            "url": "https://cdn.example.com/abc.jpg",
            "title": "1700000000_beach_day.jpg",
            "desc": null,
            "dateCreated": "2024-05-01T10:00:00"
        }"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id, "12");
        assert_eq!(photo.photo_key, "users/3/abc.jpg");
        assert_eq!(photo.desc, "");
        assert_eq!(photo.display_desc(), DEFAULT_DESCRIPTION);
        assert_eq!(photo.display_title(), "Beach Day");
        assert!(photo.created_at().is_some());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-05-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00.1234567").is_some());
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut photos = vec![
            photo("old", "2023-01-01T00:00:00Z"),
            photo("broken", "not a date"),
            photo("new", "2024-06-01T12:00:00Z"),
            photo("mid", "2023-06-01T12:00:00"),
        ];
        sort_newest_first(&mut photos);
        let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "broken"]);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("1699999999_summer-trip_day_1.jpg"), "Summer Trip Day 1");
        assert_eq!(clean_title("sunset.png"), "Sunset");
        assert_eq!(clean_title("my photo"), "My Photo");
        assert_eq!(clean_title("archive.tar.gz"), "Archive.Tar");
        assert_eq!(clean_title(""), "");
    }
}
