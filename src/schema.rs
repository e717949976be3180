//! Table metadata for persisted records.
//!
//! A [`SchemaRegistry`] is built by whatever routine sets up persistence and
//! passed around explicitly. Nothing is registered as a side effect of
//! declaring a type.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

use log::{debug, info};
use sqlx::SqlitePool;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
}

impl Column {
    /// A nullable, non-key column.
    pub fn new(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            primary_key: false,
            nullable: true,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.ty);
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            def.push_str(" NOT NULL");
        }
        def
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: &'static str, columns: Vec<Column>) -> Self {
        TableSchema { name, columns }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }

    fn check(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::NoColumns(self.name.to_string()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name) {
                return Err(Error::DuplicateColumn {
                    table: self.name.to_string(),
                    column: column.name.to_string(),
                });
            }
        }

        if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(Error::MultiplePrimaryKeys(self.name.to_string()));
        }

        Ok(())
    }
}

/// A record type stored in its own table.
pub trait Table {
    const NAME: &'static str;

    fn columns() -> Vec<Column>;

    fn schema() -> TableSchema {
        TableSchema::new(Self::NAME, Self::columns())
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<&'static str, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Table>(&mut self) -> Result<&mut Self> {
        self.register_schema(T::schema())
    }

    pub fn register_schema(&mut self, schema: TableSchema) -> Result<&mut Self> {
        schema.check()?;
        if self.tables.contains_key(schema.name) {
            return Err(Error::DuplicateTable(schema.name.to_string()));
        }

        debug!(
            "registered table `{}` with {} columns",
            schema.name,
            schema.columns.len()
        );
        self.tables.insert(schema.name, schema);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Registered tables ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Creates every registered table that does not exist yet.
    pub async fn create_all(&self, pool: &SqlitePool) -> Result<()> {
        for table in self.tables() {
            let sql = table.create_table_sql();
            debug!("executing: {}", sql);
            sqlx::query(&sql).execute(pool).await?;
        }
        info!("created {} tables", self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    struct Empty;

    impl Table for Empty {
        const NAME: &'static str = "empty";

        fn columns() -> Vec<Column> {
            Vec::new()
        }
    }

    #[test]
    fn column_definitions() {
        let schema = TableSchema::new(
            "things",
            vec![
                Column::new("id", ColumnType::Integer).primary_key(),
                Column::new("label", ColumnType::Text).not_null(),
                Column::new("note", ColumnType::Text),
            ],
        );
        assert_eq!(
            schema.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS things (id INTEGER PRIMARY KEY, label TEXT NOT NULL, note TEXT)"
        );
        assert_eq!(schema.primary_key().map(|c| c.name), Some("id"));
        assert!(schema.column("missing").is_none());
    }

    #[test]
    fn register_user_table() {
        let mut registry = SchemaRegistry::new();
        registry.register::<User>().unwrap();

        let users = registry.get("users").unwrap();
        let names: Vec<_> = users.columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["id", "email"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register::<User>().unwrap();

        let err = registry.register::<User>().unwrap_err();
        assert!(matches!(err, Error::DuplicateTable(name) if name == "users"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_tables_are_rejected() {
        let mut registry = SchemaRegistry::new();

        let err = registry.register::<Empty>().unwrap_err();
        assert!(matches!(err, Error::NoColumns(_)));

        let err = registry
            .register_schema(TableSchema::new(
                "twice",
                vec![
                    Column::new("a", ColumnType::Text),
                    Column::new("a", ColumnType::Integer),
                ],
            ))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { column, .. } if column == "a"));

        let err = registry
            .register_schema(TableSchema::new(
                "keys",
                vec![
                    Column::new("a", ColumnType::Integer).primary_key(),
                    Column::new("b", ColumnType::Integer).primary_key(),
                ],
            ))
            .unwrap_err();
        assert!(matches!(err, Error::MultiplePrimaryKeys(_)));

        assert!(registry.is_empty());
    }

    #[test]
    fn registries_are_independent() {
        let mut first = SchemaRegistry::new();
        first.register::<User>().unwrap();
        let second = SchemaRegistry::new();

        assert!(first.get("users").is_some());
        assert!(second.get("users").is_none());
    }

    #[tokio::test]
    async fn create_all_is_idempotent() {
        let pool = crate::test_pool().await;
        let mut registry = SchemaRegistry::new();
        registry.register::<User>().unwrap();

        registry.create_all(&pool).await.unwrap();
        registry.create_all(&pool).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
