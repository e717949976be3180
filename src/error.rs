use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("table `{0}` is already registered")]
    DuplicateTable(String),

    #[error("table `{table}` declares column `{column}` more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("table `{0}` declares no columns")]
    NoColumns(String),

    #[error("table `{0}` declares more than one primary key column")]
    MultiplePrimaryKeys(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
