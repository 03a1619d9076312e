use chrono::NaiveDate;

use crate::db::SqlExecutor;
use crate::error::DbError;
use crate::model::Birthday;

const SCREEN_BIRTHDAYS: &str = "screen_birthdays";
const ID: &str = "id";

const SELECT_BIRTHDAY: &str =
    "SELECT id, member_id, date_of_birth FROM screen_birthdays WHERE id = ?";
const SELECT_MEMBER_IDS_WITH_BIRTHDAY_TODAY: &str =
    "SELECT member_id FROM screen_birthdays \
    WHERE EXTRACT(DAY FROM date_of_birth) = EXTRACT(DAY FROM CURRENT_DATE) \
    AND EXTRACT(MONTH FROM date_of_birth) = EXTRACT(MONTH FROM CURRENT_DATE) \
    ORDER BY member_id";

#[derive(Clone)]
pub struct BirthdayDb {
    db: SqlExecutor,
}

impl BirthdayDb {
    pub fn new(db: SqlExecutor) -> BirthdayDb {
        BirthdayDb { db }
    }

    /// Members born on today's day and month, in the database's time zone.
    pub async fn get_member_ids_with_birthday_today(&self) -> Result<Vec<i64>, DbError> {
        let rows: Vec<(i64,)> = self.db.read_all(SELECT_MEMBER_IDS_WITH_BIRTHDAY_TODAY, vec!()).await?;
        Ok(rows.into_iter().map(|(member_id,)| member_id).collect())
    }

    pub async fn get_birthday(&self, id: i64) -> Result<Birthday, DbError> {
        self.db.read_one(SELECT_BIRTHDAY, vec!(id.into()))
            .await?
            .ok_or_else(|| DbError::not_found("birthday", id))
    }

    pub async fn insert_birthday(&self, member_id: i64, date_of_birth: NaiveDate) -> Result<i64, DbError> {
        self.db.create(
            SCREEN_BIRTHDAYS,
            ID,
            &["member_id", "date_of_birth"],
            vec!(member_id.into(), date_of_birth.into()),
        ).await
    }

    pub async fn delete_birthday(&self, id: i64) -> Result<bool, DbError> {
        self.db.delete(SCREEN_BIRTHDAYS, ID, id, &[]).await
    }
}
