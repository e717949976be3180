//! Lifecycle operations on the `users` table.

use log::debug;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::user::User;

pub const LIST_USERS_SQL: &str = "SELECT id, email FROM users ORDER BY id ASC LIMIT ?";

/// Inserts a user and returns it with the id the database assigned.
pub async fn insert(pool: &SqlitePool, email: Option<&str>) -> Result<User> {
    let id = sqlx::query("INSERT INTO users (email) VALUES (?)")
        .bind(email)
        .execute(pool)
        .await?
        .last_insert_rowid();
    debug!("inserted user {}", id);

    Ok(User::new(Some(id), email.map(String::from)))
}

pub async fn fetch(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, email FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Returns whether a row was changed.
pub async fn update_email(pool: &SqlitePool, id: i64, email: Option<&str>) -> Result<bool> {
    let done = sqlx::query("UPDATE users SET email = ? WHERE id = ?")
        .bind(email)
        .bind(id)
        .execute(pool)
        .await?;
    debug!("updated email of user {}: {} rows", id, done.rows_affected());
    Ok(done.rows_affected() > 0)
}

/// Returns whether a row was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let done = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    debug!("deleted user {}: {} rows", id, done.rows_affected());
    Ok(done.rows_affected() > 0)
}

pub async fn list(pool: &SqlitePool, limit: u32) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(LIST_USERS_SQL)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(users)
}
