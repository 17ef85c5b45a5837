use thiserror::Error;

/// Typed store failures. Constraint violations surface as distinct variants
/// rather than raw sqlite errors so callers can branch on them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("not found")]
    NotFound,

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Map a sqlite constraint failure onto the typed taxonomy. Unique violations
/// name the offending index in the message ("users.username" etc.); foreign
/// key failures mean the referenced row does not exist.
pub(crate) fn map_constraint(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("FOREIGN KEY") {
                return StoreError::NotFound;
            }
            if msg.contains("users.username") {
                return StoreError::Duplicate("username");
            }
            if msg.contains("users.email") {
                return StoreError::Duplicate("email");
            }
            if msg.contains("likes.") {
                return StoreError::Duplicate("like");
            }
            if msg.contains("follows.") {
                return StoreError::Duplicate("follow");
            }
        }
    }
    StoreError::Sqlite(err)
}
