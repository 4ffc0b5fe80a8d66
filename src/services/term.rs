//! Term service
//!
//! Category and tag management. One service instance is bound to a single
//! [`Taxonomy`], mirroring how the content service is bound to a kind.

use crate::db::repositories::{is_unique_violation, TermRepository};
use crate::models::{slug_from_title, Taxonomy, Term};
use anyhow::Context;
use std::sync::Arc;

/// Error types for term operations
#[derive(Debug, thiserror::Error)]
pub enum TermServiceError {
    #[error("Not found")]
    NotFound,

    #[error("Term already exists: {0}")]
    TermExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for creating a term
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Partial update for a term
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTermInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Term service bound to one taxonomy
pub struct TermService {
    repo: Arc<dyn TermRepository>,
    taxonomy: Taxonomy,
}

impl TermService {
    pub fn new(repo: Arc<dyn TermRepository>, taxonomy: Taxonomy) -> Self {
        Self { repo, taxonomy }
    }

    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    /// Create a term, deriving the slug from the name when absent.
    ///
    /// Slugs are unique within a taxonomy; a duplicate is a conflict.
    pub async fn create(&self, input: CreateTermInput) -> Result<Term, TermServiceError> {
        if input.name.trim().is_empty() {
            return Err(TermServiceError::ValidationError(
                "Name must not be empty".to_string(),
            ));
        }

        let slug = match input.slug.filter(|s| !s.trim().is_empty()) {
            Some(slug) => slug,
            None => slug_from_title(&input.name),
        };

        if self
            .repo
            .get_by_slug(self.taxonomy, &slug)
            .await
            .context("Failed to check slug")?
            .is_some()
        {
            return Err(TermServiceError::TermExists(format!(
                "Slug '{}' is already used in this taxonomy",
                slug
            )));
        }

        let term = Term::new(self.taxonomy, input.name, slug, input.description);
        let created = self
            .repo
            .create(&term)
            .await
            .map_err(Self::map_conflict)?;
        Ok(created)
    }

    /// Concurrent writes can both pass the slug check; the loser's
    /// constraint error is still a conflict.
    fn map_conflict(err: anyhow::Error) -> TermServiceError {
        if is_unique_violation(&err) {
            TermServiceError::TermExists(
                "Slug is already used in this taxonomy".to_string(),
            )
        } else {
            TermServiceError::InternalError(err.context("Failed to write term"))
        }
    }

    pub async fn get(&self, id: i64) -> Result<Term, TermServiceError> {
        self.repo
            .get(id, self.taxonomy)
            .await
            .context("Failed to get term")?
            .ok_or(TermServiceError::NotFound)
    }

    /// List terms of this taxonomy, newest first, optionally narrowed to an
    /// exact slug match. Page and limit clamped to at least 1.
    pub async fn list(
        &self,
        slug: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Term>, i64), TermServiceError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let (items, total) = self
            .repo
            .list(self.taxonomy, slug, page, limit)
            .await
            .context("Failed to list terms")?;
        Ok((items, total))
    }

    pub async fn update(&self, id: i64, input: UpdateTermInput) -> Result<Term, TermServiceError> {
        let mut term = self.get(id).await?;

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(TermServiceError::ValidationError(
                    "Name must not be empty".to_string(),
                ));
            }
            term.name = name;
        }
        if let Some(slug) = input.slug {
            if slug != term.slug {
                if self
                    .repo
                    .get_by_slug(self.taxonomy, &slug)
                    .await
                    .context("Failed to check slug")?
                    .is_some()
                {
                    return Err(TermServiceError::TermExists(format!(
                        "Slug '{}' is already used in this taxonomy",
                        slug
                    )));
                }
                term.slug = slug;
            }
        }
        if let Some(description) = input.description {
            term.description = description;
        }

        let updated = self
            .repo
            .update(&term)
            .await
            .map_err(Self::map_conflict)?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TermServiceError> {
        let deleted = self
            .repo
            .delete(id, self.taxonomy)
            .await
            .context("Failed to delete term")?;
        if !deleted {
            return Err(TermServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTermRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_pair() -> (TermService, TermService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTermRepository::shared(pool);
        (
            TermService::new(repo.clone(), Taxonomy::Category),
            TermService::new(repo, Taxonomy::PostTag),
        )
    }

    fn named(name: &str) -> CreateTermInput {
        CreateTermInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let (categories, _) = setup_pair().await;
        let created = categories
            .create(named("Current Events"))
            .await
            .expect("create failed");
        assert_eq!(created.slug, "current-events");
        assert_eq!(created.taxonomy, Taxonomy::Category);
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_conflicts() {
        let (categories, tags) = setup_pair().await;
        categories.create(named("News")).await.expect("create failed");

        let result = categories.create(named("News")).await;
        assert!(matches!(result, Err(TermServiceError::TermExists(_))));

        // The other taxonomy is unaffected
        tags.create(named("News")).await.expect("create failed");
    }

    #[tokio::test]
    async fn test_lost_insert_race_maps_to_conflict() {
        let (categories, _) = setup_pair().await;
        let first = categories.create(named("News")).await.expect("create failed");

        let dup = Term::new(
            Taxonomy::Category,
            "Other News".to_string(),
            first.slug,
            String::new(),
        );
        let err = categories
            .repo
            .create(&dup)
            .await
            .expect_err("insert should fail");
        assert!(matches!(
            TermService::map_conflict(err),
            TermServiceError::TermExists(_)
        ));
    }

    #[tokio::test]
    async fn test_get_wrong_taxonomy_is_not_found() {
        let (categories, tags) = setup_pair().await;
        let created = categories.create(named("News")).await.expect("create failed");

        assert!(matches!(
            tags.get(created.id).await,
            Err(TermServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_slug_filter() {
        let (categories, _) = setup_pair().await;
        categories.create(named("News")).await.expect("create failed");
        categories.create(named("Opinion")).await.expect("create failed");

        let (items, total) = categories
            .list(Some("opinion"), 1, 10)
            .await
            .expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "Opinion");
    }

    #[tokio::test]
    async fn test_update_slug_conflict_checked() {
        let (categories, _) = setup_pair().await;
        categories.create(named("News")).await.expect("create failed");
        let other = categories.create(named("Opinion")).await.expect("create failed");

        let result = categories
            .update(
                other.id,
                UpdateTermInput {
                    slug: Some("news".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(TermServiceError::TermExists(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (categories, _) = setup_pair().await;
        let created = categories.create(named("News")).await.expect("create failed");

        categories.delete(created.id).await.expect("delete failed");
        assert!(matches!(
            categories.delete(created.id).await,
            Err(TermServiceError::NotFound)
        ));
    }
}
