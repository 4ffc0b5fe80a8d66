//! Database layer
//!
//! Relational storage for users, contents and terms. Two backends are
//! supported behind the [`DatabasePool`] trait:
//! - SQLite (default, single-binary deployment and tests)
//! - MySQL (the schema this system mirrors traditionally runs on it)
//!
//! The driver is selected from configuration; repositories dispatch on
//! `pool.driver()` per query.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
