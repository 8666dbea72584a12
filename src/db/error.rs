use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(rusqlite::Error),

    /// A UNIQUE or PRIMARY KEY constraint rejected the write. `column` is the first offending column.
    #[error("Unique constraint violated on {column}")]
    UniqueViolation { column: String },

    #[error("Foreign key constraint violated")]
    ForeignKeyViolation,
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message) => match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepositoryError::UniqueViolation {
                        column: message
                            .as_deref()
                            .and_then(constraint_column)
                            .unwrap_or_default(),
                    }
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation,
                _ => RepositoryError::Sql(err),
            },
            _ => RepositoryError::Sql(err),
        }
    }
}

/// SQLite reports constraint failures as `UNIQUE constraint failed: users.email[, ...]`.
fn constraint_column(message: &str) -> Option<String> {
    let (_, columns) = message.split_once(": ")?;
    let first = columns.split(',').next()?.trim();
    let column = first.rsplit('.').next()?;
    (!column.is_empty()).then(|| column.to_string())
}
