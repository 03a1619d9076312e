//! Collection reads that tolerate individual failures.
//!
//! `get_active_polls`, `get_latest_polls` and
//! `get_most_recently_expired_poll` return whatever could be assembled: a
//! poll that fails is reported to the [`SkipObserver`] and left out. The
//! caller gets a complete-looking list either way, so anything relying on
//! completeness should check the observer.

use async_trait::async_trait;

use crate::{error::DbError, model::Poll};

#[cfg(test)]
use mockall::automock;

/// Reads one assembled poll.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PollReader: Send + Sync {
    async fn get_poll(&self, poll_id: i64) -> Result<Poll, DbError>;
}

/// Told about every poll a batch read had to leave out.
#[cfg_attr(test, automock)]
pub trait SkipObserver: Send + Sync {
    fn poll_skipped(&self, operation: &'static str, poll_id: i64, error: &DbError);
}

/// Writes skipped polls to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SkipObserver for LogObserver {
    fn poll_skipped(&self, operation: &'static str, poll_id: i64, error: &DbError) {
        error!("{} skipped poll_id={}: {}", operation, poll_id, error);
    }
}

/// Assembles every poll in `poll_ids`, in order, skipping failures.
pub async fn assemble_polls<R>(
    reader: &R,
    observer: &dyn SkipObserver,
    operation: &'static str,
    poll_ids: &[i64],
) -> Vec<Poll>
where R: PollReader + ?Sized {
    let mut polls = Vec::with_capacity(poll_ids.len());
    for &poll_id in poll_ids {
        match reader.get_poll(poll_id).await {
            Ok(poll) => polls.push(poll),
            Err(e) => observer.poll_skipped(operation, poll_id, &e),
        }
    }
    polls
}
