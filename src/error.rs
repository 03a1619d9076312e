use std::{fmt, time::Duration};

use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";
/// SQLSTATE class of values the column cannot hold: too long, out of range,
/// malformed.
const DATA_EXCEPTION_CLASS: &str = "22";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl ConstraintKind {
    fn from_sqlstate(code: &str) -> Option<ConstraintKind> {
        match code {
            UNIQUE_VIOLATION => Some(ConstraintKind::Unique),
            FOREIGN_KEY_VIOLATION => Some(ConstraintKind::ForeignKey),
            NOT_NULL_VIOLATION => Some(ConstraintKind::NotNull),
            CHECK_VIOLATION => Some(ConstraintKind::Check),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        write!(f, "{}", name)
    }
}

/// Every failure a repository call can surface.
///
/// `NotFound` and `ConstraintViolation` are the two variants callers are
/// expected to match on ("poll does not exist", "you already voted");
/// everything else is an unexpected failure.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Also raised for values the database refused to store, such as a
    /// card id longer than its column or a price out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} constraint violated ({}): {message}", .constraint.as_deref().unwrap_or("unnamed"))]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: Option<String>,
        message: String,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("round trip exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> DbError {
        DbError::NotFound { entity, id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// A uniqueness constraint rejected the write, e.g. a second vote by the
    /// same user on the same poll.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DbError::ConstraintViolation { kind: ConstraintKind::Unique, .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> DbError {
        if let Some(de) = e.as_database_error() {
            if let Some(code) = de.code() {
                if let Some(kind) = ConstraintKind::from_sqlstate(&code) {
                    return DbError::ConstraintViolation {
                        kind,
                        constraint: de.constraint().map(String::from),
                        message: de.message().to_owned(),
                    };
                }
                if is_data_exception(&code) {
                    return DbError::InvalidArgument(de.message().to_owned());
                }
            }
        }
        DbError::StorageUnavailable(e)
    }
}

fn is_data_exception(code: &str) -> bool {
    code.starts_with(DATA_EXCEPTION_CLASS)
}
