//! Content model
//!
//! Posts, pages and media attachments share one physical table, told apart
//! by the [`ContentType`] discriminator. Every query against the table must
//! filter on the discriminator: an id stored under another type is treated
//! as absent, never returned as the wrong kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator distinguishing the content kinds sharing one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Blog post
    Post,
    /// Static page (may reference a parent page)
    Page,
    /// Media attachment (file metadata, URL in `guid`)
    Attachment,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Post => write!(f, "post"),
            ContentType::Page => write!(f, "page"),
            ContentType::Attachment => write!(f, "attachment"),
        }
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" => Ok(ContentType::Post),
            "page" => Ok(ContentType::Page),
            "attachment" => Ok(ContentType::Attachment),
            _ => Err(anyhow::anyhow!("Invalid content type: {}", s)),
        }
    }
}

/// Publication status of a content record.
///
/// `Inherit` is the fixed status of media attachments, which take their
/// visibility from the record they are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Inherit,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::Draft => write!(f, "draft"),
            ContentStatus::Published => write!(f, "published"),
            ContentStatus::Inherit => write!(f, "inherit"),
        }
    }
}

impl FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "inherit" => Ok(ContentStatus::Inherit),
            _ => Err(anyhow::anyhow!("Invalid content status: {}", s)),
        }
    }
}

/// Polymorphic content record (post, page or attachment).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: i64,
    /// Kind discriminator; required at every query boundary
    pub content_type: ContentType,
    pub title: String,
    /// Post/page body; attachment caption
    pub body: String,
    /// Post/page excerpt; attachment alt text
    pub excerpt: String,
    pub status: ContentStatus,
    /// URL slug; attachment filename
    pub slug: String,
    pub author_id: i64,
    /// Parent record id, 0 when none
    pub parent_id: i64,
    /// MIME type of attachments, empty otherwise
    pub mime_type: String,
    /// Attachment URL, empty otherwise
    pub guid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    /// Create a new record of the given kind with empty optional fields.
    pub fn new(content_type: ContentType, title: String, body: String, slug: String, author_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            content_type,
            title,
            body,
            excerpt: String::new(),
            status: ContentStatus::Draft,
            slug,
            author_id,
            parent_id: 0,
            mime_type: String::new(),
            guid: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derive a URL slug from a title: lowercase, non-alphanumeric runs become
/// single hyphens, leading/trailing hyphens trimmed.
pub fn slug_from_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen && !out.is_empty() {
            out.push('-');
            last_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip() {
        for t in [ContentType::Post, ContentType::Page, ContentType::Attachment] {
            assert_eq!(ContentType::from_str(&t.to_string()).unwrap(), t);
        }
        assert!(ContentType::from_str("revision").is_err());
    }

    #[test]
    fn test_content_status_round_trip() {
        for s in [ContentStatus::Draft, ContentStatus::Published, ContentStatus::Inherit] {
            assert_eq!(ContentStatus::from_str(&s.to_string()).unwrap(), s);
        }
        assert!(ContentStatus::from_str("pending").is_err());
    }

    #[test]
    fn test_new_content_defaults() {
        let c = Content::new(
            ContentType::Post,
            "Hello".to_string(),
            "Body".to_string(),
            "hello".to_string(),
            7,
        );
        assert_eq!(c.id, 0);
        assert_eq!(c.status, ContentStatus::Draft);
        assert_eq!(c.parent_id, 0);
        assert_eq!(c.author_id, 7);
        assert!(c.mime_type.is_empty());
    }

    #[test]
    fn test_slug_from_title() {
        assert_eq!(slug_from_title("Hello World"), "hello-world");
        assert_eq!(slug_from_title("  Already--Slugged!  "), "already-slugged");
        assert_eq!(slug_from_title("C'est la vie"), "c-est-la-vie");
        assert_eq!(slug_from_title("!!!"), "");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn slug_is_url_safe(title in "\\PC{0,60}") {
            let slug = slug_from_title(&title);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}
