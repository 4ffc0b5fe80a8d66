//! Content service
//!
//! Business logic for the three content kinds. One service instance is
//! bound to a single [`ContentType`] at construction, so the posts, pages
//! and media endpoints share this code while staying isolated from each
//! other's rows.

use crate::db::repositories::{ContentFilter, ContentRepository};
use crate::models::{slug_from_title, Content, ContentStatus, ContentType};
use anyhow::Context;
use std::sync::Arc;

/// Error types for content operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for creating a content record
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentInput {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
}

/// Partial update for a content record. Absent fields keep their value.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<ContentStatus>,
    pub slug: Option<String>,
    pub parent_id: Option<i64>,
    pub mime_type: Option<String>,
    pub guid: Option<String>,
}

/// Content service bound to one content kind
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    kind: ContentType,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>, kind: ContentType) -> Self {
        Self { repo, kind }
    }

    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// Create a record of this service's kind.
    ///
    /// Posts and pages derive their slug from the title when none is given
    /// and default to draft status. Attachments default to inherit status.
    pub async fn create(
        &self,
        author_id: i64,
        input: CreateContentInput,
    ) -> Result<Content, ContentServiceError> {
        if input.title.trim().is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Title must not be empty".to_string(),
            ));
        }

        let slug = match input.slug.filter(|s| !s.trim().is_empty()) {
            Some(slug) => slug,
            None => slug_from_title(&input.title),
        };

        let mut content = Content::new(self.kind, input.title, input.body, slug, author_id);
        content.excerpt = input.excerpt;
        content.status = input.status.unwrap_or(match self.kind {
            ContentType::Attachment => ContentStatus::Inherit,
            _ => ContentStatus::Draft,
        });
        if let Some(parent_id) = input.parent_id {
            content.parent_id = parent_id;
        }
        if let Some(mime_type) = input.mime_type {
            content.mime_type = mime_type;
        }
        if let Some(guid) = input.guid {
            content.guid = guid;
        }

        let created = self
            .repo
            .create(&content)
            .await
            .context("Failed to create content")?;
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Content, ContentServiceError> {
        self.repo
            .get(id, self.kind)
            .await
            .context("Failed to get content")?
            .ok_or(ContentServiceError::NotFound)
    }

    /// List records of this kind, newest first.
    ///
    /// Page and limit are clamped to at least 1. At most one extra filter
    /// applies on top of the kind.
    pub async fn list(
        &self,
        filter: Option<ContentFilter>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Content>, i64), ContentServiceError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let (items, total) = self
            .repo
            .list(self.kind, filter.as_ref(), page, limit)
            .await
            .context("Failed to list contents")?;
        Ok((items, total))
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateContentInput,
    ) -> Result<Content, ContentServiceError> {
        let mut content = self.get(id).await?;

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ContentServiceError::ValidationError(
                    "Title must not be empty".to_string(),
                ));
            }
            content.title = title;
        }
        if let Some(body) = input.body {
            content.body = body;
        }
        if let Some(excerpt) = input.excerpt {
            content.excerpt = excerpt;
        }
        if let Some(status) = input.status {
            content.status = status;
        }
        if let Some(slug) = input.slug {
            content.slug = slug;
        }
        if let Some(parent_id) = input.parent_id {
            content.parent_id = parent_id;
        }
        if let Some(mime_type) = input.mime_type {
            content.mime_type = mime_type;
        }
        if let Some(guid) = input.guid {
            content.guid = guid;
        }

        let updated = self
            .repo
            .update(&content)
            .await
            .context("Failed to update content")?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let deleted = self
            .repo
            .delete(id, self.kind)
            .await
            .context("Failed to delete content")?;
        if !deleted {
            return Err(ContentServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContentRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup(kind: ContentType) -> ContentService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContentService::new(SqlxContentRepository::shared(pool), kind)
    }

    /// Two services over the same repository, for cross-kind checks
    async fn setup_pair(a: ContentType, b: ContentType) -> (ContentService, ContentService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxContentRepository::shared(pool);
        (
            ContentService::new(repo.clone(), a),
            ContentService::new(repo, b),
        )
    }

    fn titled(title: &str) -> CreateContentInput {
        CreateContentInput {
            title: title.to_string(),
            body: "body".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_post_derives_slug_and_defaults_to_draft() {
        let posts = setup(ContentType::Post).await;
        let created = posts
            .create(1, titled("Hello World Again"))
            .await
            .expect("create failed");

        assert_eq!(created.slug, "hello-world-again");
        assert_eq!(created.status, ContentStatus::Draft);
        assert_eq!(created.content_type, ContentType::Post);
        assert_eq!(created.author_id, 1);
    }

    #[tokio::test]
    async fn test_create_attachment_defaults_to_inherit() {
        let media = setup(ContentType::Attachment).await;
        let mut input = titled("photo");
        input.mime_type = Some("image/jpeg".to_string());
        input.guid = Some("/uploads/photo.jpg".to_string());

        let created = media.create(1, input).await.expect("create failed");
        assert_eq!(created.status, ContentStatus::Inherit);
        assert_eq!(created.guid, "/uploads/photo.jpg");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let posts = setup(ContentType::Post).await;
        let result = posts.create(1, titled("   ")).await;
        assert!(matches!(
            result,
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_get_wrong_kind_is_not_found() {
        let (posts, pages) = setup_pair(ContentType::Post, ContentType::Page).await;
        let created = posts.create(1, titled("Only a post")).await.expect("create failed");

        assert!(matches!(
            pages.get(created.id).await,
            Err(ContentServiceError::NotFound)
        ));
        posts.get(created.id).await.expect("get failed");
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let posts = setup(ContentType::Post).await;
        let created = posts.create(1, titled("Original")).await.expect("create failed");

        let updated = posts
            .update(
                created.id,
                UpdateContentInput {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        assert_eq!(updated.status, ContentStatus::Published);
        // Untouched fields survive
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.slug, created.slug);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let posts = setup(ContentType::Post).await;
        assert!(matches!(
            posts.delete(12345).await,
            Err(ContentServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_clamps_page_and_limit() {
        let posts = setup(ContentType::Post).await;
        posts.create(1, titled("A")).await.expect("create failed");
        posts.create(1, titled("B")).await.expect("create failed");

        // page 0 and limit 0 behave as page 1, limit 1
        let (items, total) = posts.list(None, 0, 0).await.expect("list failed");
        assert_eq!(items.len(), 1);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_list_far_beyond_last_page_is_empty() {
        // Offset arithmetic must not overflow on an extreme page number
        let posts = setup(ContentType::Post).await;
        posts.create(1, titled("Only one")).await.expect("create failed");

        let (items, total) = posts.list(None, i64::MAX, 10).await.expect("list failed");
        assert!(items.is_empty());
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let posts = setup(ContentType::Post).await;
        let mut published = titled("Published one");
        published.status = Some(ContentStatus::Published);
        posts.create(1, published).await.expect("create failed");
        posts.create(1, titled("Draft one")).await.expect("create failed");

        let (items, total) = posts
            .list(Some(ContentFilter::Status(ContentStatus::Published)), 1, 10)
            .await
            .expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Published one");
    }
}
