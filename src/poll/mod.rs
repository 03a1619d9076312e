//! Repository for the `polls`, `options` and `votes` tables.
//!
//! A poll is open while `expires_at` is null or in the future. Expiry only
//! filters reads: votes and edits on an expired poll are still accepted.

mod batch;
mod options;
mod votes;

pub use batch::*;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::{PollSnapshot, SqlExecutor, SqlParam, Timestamp};
use crate::error::DbError;
use crate::model::Poll;

pub(crate) mod sql {
    pub const SELECT_POLL: &str =
        "SELECT poll_id AS id, question, published_at, expires_at FROM polls WHERE poll_id = ?";
    pub const SELECT_OPTIONS: &str =
        "SELECT option_id AS id, poll_id, text FROM options WHERE poll_id = ? ORDER BY option_id";
    pub const SELECT_OPTION: &str =
        "SELECT option_id AS id, poll_id, text FROM options WHERE option_id = ?";
    pub const SELECT_VOTES: &str =
        "SELECT vote_id AS id, poll_id, option_id, user_id, published_at \
        FROM votes WHERE option_id = ? ORDER BY vote_id";
    pub const SELECT_ACTIVE_POLL_IDS: &str =
        "SELECT poll_id FROM polls WHERE expires_at > NOW() OR expires_at IS NULL ORDER BY poll_id";
    pub const SELECT_MOST_RECENTLY_EXPIRED_POLL_ID: &str =
        "SELECT poll_id FROM polls WHERE expires_at <= NOW() \
        ORDER BY expires_at DESC, poll_id DESC LIMIT 1";
    pub const SELECT_LATEST_POLL_IDS: &str =
        "SELECT poll_id FROM polls ORDER BY poll_id DESC LIMIT ?";
    pub const HAS_USER_VOTED: &str =
        "SELECT EXISTS (SELECT 1 FROM votes WHERE poll_id = ? AND user_id = ?)";
}

const POLLS: &str = "polls";
const POLL_ID: &str = "poll_id";

/// Changes to apply to a poll. Fields left `None` are kept as they are.
///
/// `clear_expires_at` removes the expiry and wins over `expires_at` when
/// both are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollUpdate {
    pub question: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub clear_expires_at: bool,
}

impl PollUpdate {
    pub fn question(question: impl Into<String>) -> PollUpdate {
        PollUpdate { question: Some(question.into()), ..PollUpdate::default() }
    }

    pub fn expires_at(expires_at: Timestamp) -> PollUpdate {
        PollUpdate { expires_at: Some(expires_at), ..PollUpdate::default() }
    }

    pub fn clear_expiry() -> PollUpdate {
        PollUpdate { clear_expires_at: true, ..PollUpdate::default() }
    }

    /// Assignment fragments and their parameters; empty when there is
    /// nothing to change.
    fn assignments(&self) -> (Vec<&'static str>, Vec<SqlParam>) {
        let mut fields = vec!();
        let mut params = vec!();
        if let Some(question) = &self.question {
            fields.push("question = ?");
            params.push(question.as_str().into());
        }
        if self.clear_expires_at {
            fields.push("expires_at = NULL");
        } else if let Some(expires_at) = self.expires_at {
            fields.push("expires_at = ?");
            params.push(expires_at.into());
        }
        (fields, params)
    }
}

#[derive(Clone)]
pub struct PollDb {
    db: SqlExecutor,
    observer: Arc<dyn SkipObserver>,
}

impl PollDb {
    pub fn new(db: SqlExecutor) -> PollDb {
        PollDb { db, observer: Arc::new(LogObserver) }
    }

    /// Replaces the default [`LogObserver`] that batch reads report skipped
    /// polls to.
    pub fn with_observer(mut self, observer: Arc<dyn SkipObserver>) -> PollDb {
        self.observer = observer;
        self
    }

    pub async fn add_poll(&self, question: &str, expires_at: Option<Timestamp>) -> Result<i64, DbError> {
        if question.trim().is_empty() {
            return Err(DbError::InvalidArgument("question must not be empty".to_owned()));
        }
        let poll_id: i64 = self.db.create(
            POLLS,
            POLL_ID,
            &["question", "expires_at"],
            vec!(question.into(), expires_at.into()),
        ).await?;
        debug!("added poll_id={}", poll_id);
        Ok(poll_id)
    }

    /// Reads the poll with all its options and their votes from a single
    /// snapshot.
    pub async fn get_poll(&self, poll_id: i64) -> Result<Poll, DbError> {
        let mut snapshot = PollSnapshot::begin(&self.db).await?;

        let poll = snapshot.select_poll(poll_id)
            .await?
            .ok_or_else(|| DbError::not_found("poll", poll_id))?;

        let option_rows = snapshot.select_options(poll_id).await?;
        let mut options = Vec::with_capacity(option_rows.len());
        for row in option_rows {
            let votes = snapshot.select_votes(row.id).await?;
            options.push(row.with_votes(votes));
        }

        snapshot.commit().await?;
        Ok(poll.with_options(options))
    }

    /// Returns `false` without touching the database when `update` carries
    /// no change.
    pub async fn update_poll(&self, poll_id: i64, update: &PollUpdate) -> Result<bool, DbError> {
        if let Some(question) = &update.question {
            if question.trim().is_empty() {
                return Err(DbError::InvalidArgument("question must not be empty".to_owned()));
            }
        }
        let (fields, params) = update.assignments();
        self.db.update(POLLS, POLL_ID, poll_id, &fields, params).await
    }

    /// Options and votes go with it.
    pub async fn delete_poll(&self, poll_id: i64) -> Result<bool, DbError> {
        self.db.delete(POLLS, POLL_ID, poll_id, &[]).await
    }

    /// Ends the poll now, whatever its expiry was.
    pub async fn expire_poll(&self, poll_id: i64) -> Result<bool, DbError> {
        self.db.update(POLLS, POLL_ID, poll_id, &["expires_at = NOW()"], vec!()).await
    }

    pub async fn get_active_poll_ids(&self) -> Result<Vec<i64>, DbError> {
        self.read_ids(sql::SELECT_ACTIVE_POLL_IDS, vec!()).await
    }

    pub async fn get_active_polls(&self) -> Result<Vec<Poll>, DbError> {
        let poll_ids = self.get_active_poll_ids().await?;
        Ok(assemble_polls(self, self.observer.as_ref(), "get_active_polls", &poll_ids).await)
    }

    /// The poll whose expiry lies furthest along while still in the past.
    /// `None` when no poll has expired or the poll could not be assembled.
    pub async fn get_most_recently_expired_poll(&self) -> Result<Option<Poll>, DbError> {
        let poll_ids = self.read_ids(sql::SELECT_MOST_RECENTLY_EXPIRED_POLL_ID, vec!()).await?;
        let mut polls = assemble_polls(
            self,
            self.observer.as_ref(),
            "get_most_recently_expired_poll",
            &poll_ids,
        ).await;
        Ok(polls.pop())
    }

    /// Newest first. A non-positive `max` returns nothing without querying.
    pub async fn get_latest_polls(&self, max: i64) -> Result<Vec<Poll>, DbError> {
        if max <= 0 {
            return Ok(vec!());
        }
        let poll_ids = self.read_ids(sql::SELECT_LATEST_POLL_IDS, vec!(max.into())).await?;
        Ok(assemble_polls(self, self.observer.as_ref(), "get_latest_polls", &poll_ids).await)
    }

    pub async fn has_user_voted(&self, poll_id: i64, user_id: i64) -> Result<bool, DbError> {
        let voted: Option<(bool,)> = self.db.read_one(
            sql::HAS_USER_VOTED,
            vec!(poll_id.into(), user_id.into()),
        ).await?;
        Ok(voted.map_or(false, |(voted,)| voted))
    }

    /// Active polls the user has not voted on yet.
    pub async fn get_votable_poll_ids(&self, user_id: i64) -> Result<Vec<i64>, DbError> {
        let mut votable = vec!();
        for poll_id in self.get_active_poll_ids().await? {
            if !self.has_user_voted(poll_id, user_id).await? {
                votable.push(poll_id);
            }
        }
        Ok(votable)
    }

    async fn read_ids(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<i64>, DbError> {
        let rows: Vec<(i64,)> = self.db.read_all(sql, params).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl PollReader for PollDb {
    async fn get_poll(&self, poll_id: i64) -> Result<Poll, DbError> {
        PollDb::get_poll(self, poll_id).await
    }
}
