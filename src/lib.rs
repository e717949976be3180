//! A `users` table: the row type, its explicit schema registration, and the
//! persistence and HTTP plumbing around it.

pub mod config;
pub mod error;
pub mod http;
pub mod row_stream;
pub mod schema;
pub mod store;
pub mod user;

pub use error::{Error, Result};
pub use schema::{Column, ColumnType, SchemaRegistry, Table, TableSchema};
pub use user::User;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Pool settings for `database_url`.
///
/// Every connection to `sqlite::memory:` opens its own database, and closing
/// the last one discards it. An in-memory pool therefore holds exactly one
/// connection that is never reaped.
pub fn pool_options(database_url: &str) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new();
    if database_url.contains(":memory:") {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options
    }
}

/// Connects and creates the tables of `registry`.
pub async fn connect(database_url: &str, registry: &SchemaRegistry) -> Result<SqlitePool> {
    let pool = pool_options(database_url).connect(database_url).await?;
    registry.create_all(&pool).await?;
    Ok(pool)
}

/// A registry holding every table this crate declares.
pub fn registry() -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register::<User>()?;
    Ok(registry)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", &SchemaRegistry::new())
        .await
        .expect("in-memory database")
}

#[cfg(test)]
pub(crate) async fn setup_test_pool() -> SqlitePool {
    let registry = registry().expect("registry");
    connect("sqlite::memory:", &registry)
        .await
        .expect("in-memory database")
}
