use std::time::Duration;

use sqlx::{Postgres, Transaction};

use super::*;
use crate::model::{OptionRow, PollRow, Vote};
use crate::poll::sql;

/// A read-only, repeatable-read transaction used to assemble one poll so
/// that its row, options and votes all come from the same snapshot.
pub struct PollSnapshot {
    tx: Transaction<'static, Postgres>,
    timeout: Option<Duration>,
}

impl PollSnapshot {

    pub async fn begin(db: &SqlExecutor) -> Result<PollSnapshot, DbError> {
        let mut tx = db.begin().await?;
        let timeout = db.round_trip_timeout();
        bounded(timeout, execute(
            &mut *tx,
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY",
            vec!(),
        )).await?;
        Ok(PollSnapshot { tx, timeout })
    }

    pub(crate) async fn select_poll(&mut self, poll_id: i64) -> Result<Option<PollRow>, DbError> {
        bounded(self.timeout, fetch_optional(&mut *self.tx, sql::SELECT_POLL, vec!(poll_id.into()))).await
    }

    pub(crate) async fn select_options(&mut self, poll_id: i64) -> Result<Vec<OptionRow>, DbError> {
        bounded(self.timeout, fetch_all(&mut *self.tx, sql::SELECT_OPTIONS, vec!(poll_id.into()))).await
    }

    pub(crate) async fn select_votes(&mut self, option_id: i64) -> Result<Vec<Vote>, DbError> {
        bounded(self.timeout, fetch_all(&mut *self.tx, sql::SELECT_VOTES, vec!(option_id.into()))).await
    }

    pub async fn commit(self) -> Result<(), DbError> {
        bounded(self.timeout, async {
            self.tx.commit().await.map_err(DbError::from)
        }).await
    }
}
