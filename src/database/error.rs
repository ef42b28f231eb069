use thiserror::Error;

/// Classification of database failures
#[derive(Debug, Clone)]
pub enum DatabaseErrorKind {
    /// Row lookup returned nothing where one was required
    NotFound { entity: String, id: String },
    /// Unique constraint violation (duplicate natural key)
    Conflict { message: String },
    /// Connection or pool failure; usually transient
    Connection { message: String },
    /// Anything else sqlx reported
    Unknown { message: String },
}

#[derive(Debug, Clone, Error)]
#[error("{}", self.message())]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self { kind }
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound {
                entity: "row".to_string(),
                id: String::new(),
            },
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseErrorKind::Conflict {
                    message: db_err.to_string(),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseErrorKind::Connection {
                    message: err.to_string(),
                }
            }
            _ => DatabaseErrorKind::Unknown {
                message: err.to_string(),
            },
        };
        Self { kind }
    }

    fn message(&self) -> String {
        match &self.kind {
            DatabaseErrorKind::NotFound { entity, id } => {
                format!("{} '{}' not found", entity, id)
            }
            DatabaseErrorKind::Conflict { message } => format!("conflict: {}", message),
            DatabaseErrorKind::Connection { message } => {
                format!("database connection error: {}", message)
            }
            DatabaseErrorKind::Unknown { message } => format!("database error: {}", message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::Connection { .. })
    }
}
