use super::*;
use crate::model::{OptionRow, PollOption, Vote};

const OPTIONS: &str = "options";
const OPTION_ID: &str = "option_id";

impl PollDb {
    pub async fn add_option(&self, poll_id: i64, text: &str) -> Result<i64, DbError> {
        if poll_id <= 0 {
            return Err(DbError::InvalidArgument(format!("poll id must be positive, got {}", poll_id)));
        }
        self.db.create(
            OPTIONS,
            OPTION_ID,
            &["poll_id", "text"],
            vec!(poll_id.into(), text.into()),
        ).await
    }

    pub async fn get_option(&self, option_id: i64) -> Result<PollOption, DbError> {
        let row: OptionRow = self.db.read_one(sql::SELECT_OPTION, vec!(option_id.into()))
            .await?
            .ok_or_else(|| DbError::not_found("option", option_id))?;
        let votes = self.get_votes(row.id).await?;
        Ok(row.with_votes(votes))
    }

    /// Every option of the poll, each with its votes. Unlike
    /// [`PollDb::get_poll`] these reads are not taken from one snapshot.
    pub async fn get_options(&self, poll_id: i64) -> Result<Vec<PollOption>, DbError> {
        let rows: Vec<OptionRow> = self.db.read_all(sql::SELECT_OPTIONS, vec!(poll_id.into())).await?;
        let mut options = Vec::with_capacity(rows.len());
        for row in rows {
            let votes: Vec<Vote> = self.get_votes(row.id).await?;
            options.push(row.with_votes(votes));
        }
        Ok(options)
    }

    pub async fn update_option(&self, option_id: i64, text: &str) -> Result<bool, DbError> {
        self.db.update(OPTIONS, OPTION_ID, option_id, &["text = ?"], vec!(text.into())).await
    }

    /// Votes on the option go with it.
    pub async fn delete_option(&self, option_id: i64) -> Result<bool, DbError> {
        self.db.delete(OPTIONS, OPTION_ID, option_id, &[]).await
    }
}
