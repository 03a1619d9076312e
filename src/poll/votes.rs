use super::*;
use crate::model::Vote;

const VOTES: &str = "votes";
const VOTE_ID: &str = "vote_id";

impl PollDb {
    /// Casts a vote.
    ///
    /// A user's second vote on the same poll fails with a unique
    /// [`DbError::ConstraintViolation`] (see [`DbError::is_duplicate`]); an
    /// option that does not belong to `poll_id` fails with a foreign key
    /// violation.
    pub async fn add_vote(&self, poll_id: i64, user_id: i64, option_id: i64) -> Result<i64, DbError> {
        let vote_id: Result<i64, DbError> = self.db.create(
            VOTES,
            VOTE_ID,
            &["poll_id", "user_id", "option_id"],
            vec!(poll_id.into(), user_id.into(), option_id.into()),
        ).await;

        match &vote_id {
            Ok(vote_id) => debug!("user_id={} voted vote_id={} on poll_id={}", user_id, vote_id, poll_id),
            Err(e) if e.is_duplicate() => info!("user_id={} already voted on poll_id={}", user_id, poll_id),
            Err(_) => (),
        }
        vote_id
    }

    pub async fn get_votes(&self, option_id: i64) -> Result<Vec<Vote>, DbError> {
        self.db.read_all(sql::SELECT_VOTES, vec!(option_id.into())).await
    }

    pub async fn delete_vote(&self, vote_id: i64) -> Result<bool, DbError> {
        self.db.delete(VOTES, VOTE_ID, vote_id, &[]).await
    }
}
