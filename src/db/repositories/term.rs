//! Term repository
//!
//! Categories and tags share the terms table, keyed by the [`Taxonomy`]
//! discriminator. Same scoping rule as contents: every query carries the
//! taxonomy in its WHERE clause.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Taxonomy, Term};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Term repository trait
#[async_trait]
pub trait TermRepository: Send + Sync {
    /// Insert a new term
    async fn create(&self, term: &Term) -> Result<Term>;

    /// Get a term by id, scoped by taxonomy
    async fn get(&self, id: i64, taxonomy: Taxonomy) -> Result<Option<Term>>;

    /// Get a term by slug within a taxonomy
    async fn get_by_slug(&self, taxonomy: Taxonomy, slug: &str) -> Result<Option<Term>>;

    /// List terms of one taxonomy, newest first, with total count.
    /// An optional slug filter narrows to an exact match.
    async fn list(
        &self,
        taxonomy: Taxonomy,
        slug: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Term>, i64)>;

    /// Update a term, returning the stored row
    async fn update(&self, term: &Term) -> Result<Term>;

    /// Delete by id and taxonomy; returns false when no row matched
    async fn delete(&self, id: i64, taxonomy: Taxonomy) -> Result<bool>;
}

/// SQLx-based term repository supporting SQLite and MySQL.
pub struct SqlxTermRepository {
    pool: DynDatabasePool,
}

impl SqlxTermRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn TermRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TermRepository for SqlxTermRepository {
    async fn create(&self, term: &Term) -> Result<Term> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), term).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), term).await,
        }
    }

    async fn get(&self, id: i64, taxonomy: Taxonomy) -> Result<Option<Term>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_sqlite(self.pool.as_sqlite().unwrap(), id, taxonomy).await
            }
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id, taxonomy).await,
        }
    }

    async fn get_by_slug(&self, taxonomy: Taxonomy, slug: &str) -> Result<Option<Term>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), taxonomy, slug).await
            }
            DatabaseDriver::Mysql => {
                get_by_slug_mysql(self.pool.as_mysql().unwrap(), taxonomy, slug).await
            }
        }
    }

    async fn list(
        &self,
        taxonomy: Taxonomy,
        slug: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Term>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), taxonomy, slug, page, limit).await
            }
            DatabaseDriver::Mysql => {
                list_mysql(self.pool.as_mysql().unwrap(), taxonomy, slug, page, limit).await
            }
        }
    }

    async fn update(&self, term: &Term) -> Result<Term> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), term).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), term).await,
        }
    }

    async fn delete(&self, id: i64, taxonomy: Taxonomy) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_sqlite(self.pool.as_sqlite().unwrap(), id, taxonomy).await
            }
            DatabaseDriver::Mysql => {
                delete_mysql(self.pool.as_mysql().unwrap(), id, taxonomy).await
            }
        }
    }
}

const TERM_COLUMNS: &str = "id, taxonomy, name, slug, description, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, term: &Term) -> Result<Term> {
    let result = sqlx::query(
        "INSERT INTO terms (taxonomy, name, slug, description, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(term.taxonomy.to_string())
    .bind(&term.name)
    .bind(&term.slug)
    .bind(&term.description)
    .bind(term.created_at)
    .execute(pool)
    .await
    .context("Failed to create term")?;

    let mut created = term.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_sqlite(pool: &SqlitePool, id: i64, taxonomy: Taxonomy) -> Result<Option<Term>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM terms WHERE id = ? AND taxonomy = ?",
        TERM_COLUMNS
    ))
    .bind(id)
    .bind(taxonomy.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to get term")?;

    row.map(|r| row_to_term_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(
    pool: &SqlitePool,
    taxonomy: Taxonomy,
    slug: &str,
) -> Result<Option<Term>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM terms WHERE taxonomy = ? AND slug = ?",
        TERM_COLUMNS
    ))
    .bind(taxonomy.to_string())
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get term by slug")?;

    row.map(|r| row_to_term_sqlite(&r)).transpose()
}

async fn list_sqlite(
    pool: &SqlitePool,
    taxonomy: Taxonomy,
    slug: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Term>, i64)> {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let where_clause = match slug {
        Some(_) => "taxonomy = ? AND slug = ?",
        None => "taxonomy = ?",
    };

    let sql = format!(
        "SELECT {} FROM terms WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        TERM_COLUMNS, where_clause
    );
    let mut query = sqlx::query(&sql).bind(taxonomy.to_string());
    if let Some(s) = slug {
        query = query.bind(s);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list terms")?;

    let mut terms = Vec::new();
    for row in rows {
        terms.push(row_to_term_sqlite(&row)?);
    }

    let count_sql = format!("SELECT COUNT(*) as count FROM terms WHERE {}", where_clause);
    let mut count_query = sqlx::query(&count_sql).bind(taxonomy.to_string());
    if let Some(s) = slug {
        count_query = count_query.bind(s);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count terms")?
        .get("count");

    Ok((terms, total))
}

async fn update_sqlite(pool: &SqlitePool, term: &Term) -> Result<Term> {
    sqlx::query(
        "UPDATE terms SET name = ?, slug = ?, description = ? WHERE id = ? AND taxonomy = ?",
    )
    .bind(&term.name)
    .bind(&term.slug)
    .bind(&term.description)
    .bind(term.id)
    .bind(term.taxonomy.to_string())
    .execute(pool)
    .await
    .context("Failed to update term")?;

    get_sqlite(pool, term.id, term.taxonomy)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Term not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64, taxonomy: Taxonomy) -> Result<bool> {
    let result = sqlx::query("DELETE FROM terms WHERE id = ? AND taxonomy = ?")
        .bind(id)
        .bind(taxonomy.to_string())
        .execute(pool)
        .await
        .context("Failed to delete term")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_term_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Term> {
    let taxonomy_str: String = row.get("taxonomy");

    Ok(Term {
        id: row.get("id"),
        taxonomy: Taxonomy::from_str(&taxonomy_str)
            .with_context(|| format!("Invalid taxonomy in database: {}", taxonomy_str))?,
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, term: &Term) -> Result<Term> {
    let result = sqlx::query(
        "INSERT INTO terms (taxonomy, name, slug, description, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(term.taxonomy.to_string())
    .bind(&term.name)
    .bind(&term.slug)
    .bind(&term.description)
    .bind(term.created_at)
    .execute(pool)
    .await
    .context("Failed to create term")?;

    let mut created = term.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_mysql(pool: &MySqlPool, id: i64, taxonomy: Taxonomy) -> Result<Option<Term>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM terms WHERE id = ? AND taxonomy = ?",
        TERM_COLUMNS
    ))
    .bind(id)
    .bind(taxonomy.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to get term")?;

    row.map(|r| row_to_term_mysql(&r)).transpose()
}

async fn get_by_slug_mysql(
    pool: &MySqlPool,
    taxonomy: Taxonomy,
    slug: &str,
) -> Result<Option<Term>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM terms WHERE taxonomy = ? AND slug = ?",
        TERM_COLUMNS
    ))
    .bind(taxonomy.to_string())
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get term by slug")?;

    row.map(|r| row_to_term_mysql(&r)).transpose()
}

async fn list_mysql(
    pool: &MySqlPool,
    taxonomy: Taxonomy,
    slug: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Term>, i64)> {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let where_clause = match slug {
        Some(_) => "taxonomy = ? AND slug = ?",
        None => "taxonomy = ?",
    };

    let sql = format!(
        "SELECT {} FROM terms WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        TERM_COLUMNS, where_clause
    );
    let mut query = sqlx::query(&sql).bind(taxonomy.to_string());
    if let Some(s) = slug {
        query = query.bind(s);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list terms")?;

    let mut terms = Vec::new();
    for row in rows {
        terms.push(row_to_term_mysql(&row)?);
    }

    let count_sql = format!("SELECT COUNT(*) as count FROM terms WHERE {}", where_clause);
    let mut count_query = sqlx::query(&count_sql).bind(taxonomy.to_string());
    if let Some(s) = slug {
        count_query = count_query.bind(s);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count terms")?
        .get("count");

    Ok((terms, total))
}

async fn update_mysql(pool: &MySqlPool, term: &Term) -> Result<Term> {
    sqlx::query(
        "UPDATE terms SET name = ?, slug = ?, description = ? WHERE id = ? AND taxonomy = ?",
    )
    .bind(&term.name)
    .bind(&term.slug)
    .bind(&term.description)
    .bind(term.id)
    .bind(term.taxonomy.to_string())
    .execute(pool)
    .await
    .context("Failed to update term")?;

    get_mysql(pool, term.id, term.taxonomy)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Term not found after update"))
}

async fn delete_mysql(pool: &MySqlPool, id: i64, taxonomy: Taxonomy) -> Result<bool> {
    let result = sqlx::query("DELETE FROM terms WHERE id = ? AND taxonomy = ?")
        .bind(id)
        .bind(taxonomy.to_string())
        .execute(pool)
        .await
        .context("Failed to delete term")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_term_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Term> {
    let taxonomy_str: String = row.get("taxonomy");

    Ok(Term {
        id: row.get("id"),
        taxonomy: Taxonomy::from_str(&taxonomy_str)
            .with_context(|| format!("Invalid taxonomy in database: {}", taxonomy_str))?,
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxTermRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTermRepository::new(pool)
    }

    fn category(name: &str) -> Term {
        Term::new(
            Taxonomy::Category,
            name.to_string(),
            crate::models::slug_from_title(name),
            String::new(),
        )
    }

    fn tag(name: &str) -> Term {
        Term::new(
            Taxonomy::PostTag,
            name.to_string(),
            crate::models::slug_from_title(name),
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_scoped_by_taxonomy() {
        let repo = setup_test_repo().await;
        let created = repo.create(&category("News")).await.expect("create failed");
        assert!(created.id > 0);

        let found = repo
            .get(created.id, Taxonomy::Category)
            .await
            .expect("query failed");
        assert!(found.is_some());

        let as_tag = repo
            .get(created.id, Taxonomy::PostTag)
            .await
            .expect("query failed");
        assert!(as_tag.is_none());
    }

    #[tokio::test]
    async fn test_same_slug_allowed_across_taxonomies() {
        let repo = setup_test_repo().await;
        repo.create(&category("Rust")).await.expect("create failed");
        // Same slug under the other taxonomy does not violate the unique index
        repo.create(&tag("Rust")).await.expect("create failed");

        let (categories, cat_total) = repo
            .list(Taxonomy::Category, None, 1, 10)
            .await
            .expect("list failed");
        assert_eq!(cat_total, 1);
        assert_eq!(categories[0].taxonomy, Taxonomy::Category);

        let (tags, tag_total) = repo
            .list(Taxonomy::PostTag, None, 1, 10)
            .await
            .expect("list failed");
        assert_eq!(tag_total, 1);
        assert_eq!(tags[0].taxonomy, Taxonomy::PostTag);
    }

    #[tokio::test]
    async fn test_duplicate_slug_within_taxonomy_fails() {
        let repo = setup_test_repo().await;
        repo.create(&category("News")).await.expect("create failed");
        let result = repo.create(&category("News")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_with_slug_filter() {
        let repo = setup_test_repo().await;
        repo.create(&category("News")).await.expect("create failed");
        repo.create(&category("Opinion")).await.expect("create failed");

        let (rows, total) = repo
            .list(Taxonomy::Category, Some("news"), 1, 10)
            .await
            .expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(rows[0].name, "News");
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let repo = setup_test_repo().await;
        repo.create(&tag("async runtime")).await.expect("create failed");

        let found = repo
            .get_by_slug(Taxonomy::PostTag, "async-runtime")
            .await
            .expect("query failed");
        assert!(found.is_some());

        let wrong_taxonomy = repo
            .get_by_slug(Taxonomy::Category, "async-runtime")
            .await
            .expect("query failed");
        assert!(wrong_taxonomy.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut created = repo.create(&category("News")).await.expect("create failed");

        created.description = "Current events".to_string();
        let updated = repo.update(&created).await.expect("update failed");
        assert_eq!(updated.description, "Current events");

        assert!(!repo
            .delete(created.id, Taxonomy::PostTag)
            .await
            .expect("delete failed"));
        assert!(repo
            .delete(created.id, Taxonomy::Category)
            .await
            .expect("delete failed"));
        assert!(repo
            .get(created.id, Taxonomy::Category)
            .await
            .expect("query failed")
            .is_none());
    }
}
