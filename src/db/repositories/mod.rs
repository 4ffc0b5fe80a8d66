//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod content;
pub mod term;
pub mod user;

pub use content::{ContentFilter, ContentRepository, SqlxContentRepository};
pub use term::{SqlxTermRepository, TermRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Whether a repository error is a UNIQUE-constraint violation.
///
/// Services check for duplicates before inserting, but two concurrent
/// inserts can both pass the check; the loser's constraint error must
/// still surface as a conflict, not an internal error.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}
