use diesel::result::{DatabaseErrorKind, Error};

/// Backend-neutral classification of a failed query.
#[derive(Debug)]
pub enum PersistenceError {
    /// The row addressed by the query does not exist.
    NotFound,
    /// A unique constraint rejected the write. Carries the constraint name when postgres reports it.
    Conflict(Option<String>),
    Other(Error),
}

pub fn classify(err: Error) -> PersistenceError {
    match err {
        Error::NotFound => PersistenceError::NotFound,
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            PersistenceError::Conflict(info.constraint_name().map(String::from))
        }
        other => PersistenceError::Other(other),
    }
}
