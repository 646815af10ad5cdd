use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("A title named '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Ambiguous short ID. Did you mean one of these?")]
    AmbiguousId(Vec<(String, String)>), // Vec of (ID, Name)
}

impl CoreError {
    /// Maps a `UNIQUE` violation on `titles.name` to [`CoreError::DuplicateName`].
    pub(crate) fn from_insert(err: sqlx::Error, name: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::DuplicateName(name.to_string())
            }
            _ => CoreError::Database(err),
        }
    }
}

/// Failure reported by a reminder provider.
///
/// These never cross the core boundary: the reminder binder logs them and
/// degrades to "no reminder".
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("calendar permission denied")]
    PermissionDenied,

    #[error("reminder {0} does not exist")]
    NotFound(String),

    #[error("calendar unavailable: {0}")]
    Unavailable(String),

    #[error("calendar IO error")]
    Io(#[from] std::io::Error),
}
