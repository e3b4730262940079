use thiserror::Error;
use vidtube_types::models::TargetKind;

/// Failures surfaced by the store. Everything except `Sqlite`/`Lock` is a
/// precondition failure detected before any write took place.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("acting user is not the owner")]
    NotOwner,

    #[error("video already present in playlist")]
    AlreadyPresent,

    #[error("video not present in playlist")]
    NotPresent,

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("concurrent toggle on the same relation")]
    ToggleConflict,

    #[error("{0} target does not exist")]
    InvalidTarget(TargetKind),

    #[error("acting user does not exist")]
    InvalidSubject,

    #[error("channel does not exist")]
    InvalidChannel,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned: {0}")]
    Lock(String),
}

impl StoreError {
    /// True when the error is a UNIQUE/PRIMARY KEY constraint violation.
    pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }

    /// Maps an insert failure on a row keyed to its owner. A foreign-key
    /// violation there means the acting user no longer exists.
    pub(crate) fn from_owner_insert(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StoreError::InvalidSubject
            }
            other => other.into(),
        }
    }
}
