use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::schema::{Column, ColumnType, Table};

/// A row of the `users` table.
///
/// Neither field is required. `id` is assigned by the database when the row
/// is inserted; `email` is stored as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: Option<i64>, email: Option<String>) -> Self {
        User { id, email }
    }
}

impl Table for User {
    const NAME: &'static str = "users";

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Integer).primary_key(),
            Column::new("email", ColumnType::Text),
        ]
    }
}

struct OrNone<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for OrNone<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("None"),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User: {}, {}", OrNone(&self.id), OrNone(&self.email))
    }
}
