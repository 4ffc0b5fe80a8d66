//! Content repository
//!
//! Database operations for the polymorphic contents table. Every accessor
//! takes the [`ContentType`] discriminator and scopes its WHERE clause with
//! it, so a row stored under another type can never leak through a lookup.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Content, ContentStatus, ContentType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Optional single extra filter on a content listing.
#[derive(Debug, Clone)]
pub enum ContentFilter {
    /// Exact status match (posts, pages)
    Status(ContentStatus),
    /// MIME type prefix match (media), e.g. "image"
    MimePrefix(String),
}

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Insert a new record
    async fn create(&self, content: &Content) -> Result<Content>;

    /// Get a record by id, scoped by discriminator
    async fn get(&self, id: i64, kind: ContentType) -> Result<Option<Content>>;

    /// List records of one kind, newest first, with total count
    async fn list(
        &self,
        kind: ContentType,
        filter: Option<&ContentFilter>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Content>, i64)>;

    /// Update a record, returning the stored row
    async fn update(&self, content: &Content) -> Result<Content>;

    /// Delete by id and discriminator; returns false when no row matched
    async fn delete(&self, id: i64, kind: ContentType) -> Result<bool>;
}

/// SQLx-based content repository supporting SQLite and MySQL.
pub struct SqlxContentRepository {
    pool: DynDatabasePool,
}

impl SqlxContentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn create(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), content).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), content).await,
        }
    }

    async fn get(&self, id: i64, kind: ContentType) -> Result<Option<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), id, kind).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id, kind).await,
        }
    }

    async fn list(
        &self,
        kind: ContentType,
        filter: Option<&ContentFilter>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Content>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), kind, filter, page, limit).await
            }
            DatabaseDriver::Mysql => {
                list_mysql(self.pool.as_mysql().unwrap(), kind, filter, page, limit).await
            }
        }
    }

    async fn update(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), content).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), content).await,
        }
    }

    async fn delete(&self, id: i64, kind: ContentType) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id, kind).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id, kind).await,
        }
    }
}

const CONTENT_COLUMNS: &str = "id, content_type, title, body, excerpt, status, slug, author_id, parent_id, mime_type, guid, created_at, updated_at";

/// Build the WHERE clause for a listing: always the discriminator first,
/// then at most one extra condition. The filter value is bound, never
/// interpolated.
fn list_where_clause(filter: Option<&ContentFilter>) -> &'static str {
    match filter {
        None => "content_type = ?",
        Some(ContentFilter::Status(_)) => "content_type = ? AND status = ?",
        Some(ContentFilter::MimePrefix(_)) => "content_type = ? AND mime_type LIKE ?",
    }
}

/// Bound value for the extra filter, if any.
fn filter_bind_value(filter: Option<&ContentFilter>) -> Option<String> {
    match filter {
        None => None,
        Some(ContentFilter::Status(s)) => Some(s.to_string()),
        Some(ContentFilter::MimePrefix(p)) => Some(format!("{}%", p)),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, content: &Content) -> Result<Content> {
    let result = sqlx::query(
        r#"
        INSERT INTO contents (content_type, title, body, excerpt, status, slug, author_id, parent_id, mime_type, guid, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(content.content_type.to_string())
    .bind(&content.title)
    .bind(&content.body)
    .bind(&content.excerpt)
    .bind(content.status.to_string())
    .bind(&content.slug)
    .bind(content.author_id)
    .bind(content.parent_id)
    .bind(&content.mime_type)
    .bind(&content.guid)
    .bind(content.created_at)
    .bind(content.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content")?;

    let mut created = content.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_sqlite(pool: &SqlitePool, id: i64, kind: ContentType) -> Result<Option<Content>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM contents WHERE id = ? AND content_type = ?",
        CONTENT_COLUMNS
    ))
    .bind(id)
    .bind(kind.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to get content")?;

    row.map(|r| row_to_content_sqlite(&r)).transpose()
}

async fn list_sqlite(
    pool: &SqlitePool,
    kind: ContentType,
    filter: Option<&ContentFilter>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Content>, i64)> {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let where_clause = list_where_clause(filter);
    let extra = filter_bind_value(filter);

    let sql = format!(
        "SELECT {} FROM contents WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        CONTENT_COLUMNS, where_clause
    );
    let mut query = sqlx::query(&sql).bind(kind.to_string());
    if let Some(ref value) = extra {
        query = query.bind(value);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list contents")?;

    let mut contents = Vec::new();
    for row in rows {
        contents.push(row_to_content_sqlite(&row)?);
    }

    let count_sql = format!("SELECT COUNT(*) as count FROM contents WHERE {}", where_clause);
    let mut count_query = sqlx::query(&count_sql).bind(kind.to_string());
    if let Some(ref value) = extra {
        count_query = count_query.bind(value);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count contents")?
        .get("count");

    Ok((contents, total))
}

async fn update_sqlite(pool: &SqlitePool, content: &Content) -> Result<Content> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE contents
        SET title = ?, body = ?, excerpt = ?, status = ?, slug = ?, parent_id = ?, mime_type = ?, guid = ?, updated_at = ?
        WHERE id = ? AND content_type = ?
        "#,
    )
    .bind(&content.title)
    .bind(&content.body)
    .bind(&content.excerpt)
    .bind(content.status.to_string())
    .bind(&content.slug)
    .bind(content.parent_id)
    .bind(&content.mime_type)
    .bind(&content.guid)
    .bind(now)
    .bind(content.id)
    .bind(content.content_type.to_string())
    .execute(pool)
    .await
    .context("Failed to update content")?;

    get_sqlite(pool, content.id, content.content_type)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64, kind: ContentType) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contents WHERE id = ? AND content_type = ?")
        .bind(id)
        .bind(kind.to_string())
        .execute(pool)
        .await
        .context("Failed to delete content")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_content_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Content> {
    let type_str: String = row.get("content_type");
    let status_str: String = row.get("status");

    Ok(Content {
        id: row.get("id"),
        content_type: ContentType::from_str(&type_str)
            .with_context(|| format!("Invalid content type in database: {}", type_str))?,
        title: row.get("title"),
        body: row.get("body"),
        excerpt: row.get("excerpt"),
        status: ContentStatus::from_str(&status_str)
            .with_context(|| format!("Invalid content status in database: {}", status_str))?,
        slug: row.get("slug"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        mime_type: row.get("mime_type"),
        guid: row.get("guid"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, content: &Content) -> Result<Content> {
    let result = sqlx::query(
        r#"
        INSERT INTO contents (content_type, title, body, excerpt, status, slug, author_id, parent_id, mime_type, guid, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(content.content_type.to_string())
    .bind(&content.title)
    .bind(&content.body)
    .bind(&content.excerpt)
    .bind(content.status.to_string())
    .bind(&content.slug)
    .bind(content.author_id)
    .bind(content.parent_id)
    .bind(&content.mime_type)
    .bind(&content.guid)
    .bind(content.created_at)
    .bind(content.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content")?;

    let mut created = content.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_mysql(pool: &MySqlPool, id: i64, kind: ContentType) -> Result<Option<Content>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM contents WHERE id = ? AND content_type = ?",
        CONTENT_COLUMNS
    ))
    .bind(id)
    .bind(kind.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to get content")?;

    row.map(|r| row_to_content_mysql(&r)).transpose()
}

async fn list_mysql(
    pool: &MySqlPool,
    kind: ContentType,
    filter: Option<&ContentFilter>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Content>, i64)> {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let where_clause = list_where_clause(filter);
    let extra = filter_bind_value(filter);

    let sql = format!(
        "SELECT {} FROM contents WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        CONTENT_COLUMNS, where_clause
    );
    let mut query = sqlx::query(&sql).bind(kind.to_string());
    if let Some(ref value) = extra {
        query = query.bind(value);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list contents")?;

    let mut contents = Vec::new();
    for row in rows {
        contents.push(row_to_content_mysql(&row)?);
    }

    let count_sql = format!("SELECT COUNT(*) as count FROM contents WHERE {}", where_clause);
    let mut count_query = sqlx::query(&count_sql).bind(kind.to_string());
    if let Some(ref value) = extra {
        count_query = count_query.bind(value);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count contents")?
        .get("count");

    Ok((contents, total))
}

async fn update_mysql(pool: &MySqlPool, content: &Content) -> Result<Content> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE contents
        SET title = ?, body = ?, excerpt = ?, status = ?, slug = ?, parent_id = ?, mime_type = ?, guid = ?, updated_at = ?
        WHERE id = ? AND content_type = ?
        "#,
    )
    .bind(&content.title)
    .bind(&content.body)
    .bind(&content.excerpt)
    .bind(content.status.to_string())
    .bind(&content.slug)
    .bind(content.parent_id)
    .bind(&content.mime_type)
    .bind(&content.guid)
    .bind(now)
    .bind(content.id)
    .bind(content.content_type.to_string())
    .execute(pool)
    .await
    .context("Failed to update content")?;

    get_mysql(pool, content.id, content.content_type)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content not found after update"))
}

async fn delete_mysql(pool: &MySqlPool, id: i64, kind: ContentType) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contents WHERE id = ? AND content_type = ?")
        .bind(id)
        .bind(kind.to_string())
        .execute(pool)
        .await
        .context("Failed to delete content")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_content_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Content> {
    let type_str: String = row.get("content_type");
    let status_str: String = row.get("status");

    Ok(Content {
        id: row.get("id"),
        content_type: ContentType::from_str(&type_str)
            .with_context(|| format!("Invalid content type in database: {}", type_str))?,
        title: row.get("title"),
        body: row.get("body"),
        excerpt: row.get("excerpt"),
        status: ContentStatus::from_str(&status_str)
            .with_context(|| format!("Invalid content status in database: {}", status_str))?,
        slug: row.get("slug"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        mime_type: row.get("mime_type"),
        guid: row.get("guid"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
