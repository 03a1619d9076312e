use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, Arguments};

use super::Timestamp;
use crate::{error::DbError, util};

/// A positional, type-tagged statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Float(Option<f64>),
    Text(String),
    Bool(bool),
    Timestamp(Option<Timestamp>),
    Date(NaiveDate),
}

impl SqlParam {
    /// Repository keys must be positive integers or non-empty text.
    pub(crate) fn validate_key(&self) -> Result<(), DbError> {
        match self {
            SqlParam::Int(id) if *id <= 0 =>
                Err(DbError::InvalidArgument(format!("id must be positive, got {}", id))),
            SqlParam::Text(id) if id.is_empty() =>
                Err(DbError::InvalidArgument("id must not be empty".to_owned())),
            SqlParam::Int(_) | SqlParam::Text(_) => Ok(()),
            other => Err(DbError::InvalidArgument(format!("{:?} cannot be used as an id", other))),
        }
    }

    fn add_to(self, args: &mut PgArguments) -> Result<(), sqlx::Error> {
        let added = match self {
            SqlParam::Int(v) => args.add(v),
            SqlParam::Float(v) => args.add(v),
            SqlParam::Text(v) => args.add(v),
            SqlParam::Bool(v) => args.add(v),
            SqlParam::Timestamp(v) => args.add(v),
            SqlParam::Date(v) => args.add(v),
        };
        added.map_err(sqlx::Error::Encode)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> SqlParam {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> SqlParam {
        SqlParam::Int(v.into())
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> SqlParam {
        SqlParam::Float(Some(v))
    }
}

impl From<Option<f64>> for SqlParam {
    fn from(v: Option<f64>) -> SqlParam {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> SqlParam {
        SqlParam::Text(v.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> SqlParam {
        SqlParam::Text(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> SqlParam {
        SqlParam::Bool(v)
    }
}

impl From<Timestamp> for SqlParam {
    fn from(v: Timestamp) -> SqlParam {
        SqlParam::Timestamp(Some(v))
    }
}

impl From<Option<Timestamp>> for SqlParam {
    fn from(v: Option<Timestamp>) -> SqlParam {
        SqlParam::Timestamp(v)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(v: NaiveDate) -> SqlParam {
        SqlParam::Date(v)
    }
}

/// Renumbers `sql`'s placeholders and binds `params` to them in order.
///
/// # Panics
///
/// When the number of placeholders differs from the number of parameters.
pub(crate) fn prepare(sql: &str, params: Vec<SqlParam>) -> Result<(String, PgArguments), DbError> {
    let (sql, placeholders) = util::number_placeholders(sql);
    assert_eq!(
        placeholders,
        params.len(),
        "statement has {} placeholders but {} parameters were supplied: {}",
        placeholders,
        params.len(),
        sql
    );

    let mut args = PgArguments::default();
    for param in params {
        param.add_to(&mut args).map_err(DbError::StorageUnavailable)?;
    }
    Ok((sql, args))
}
