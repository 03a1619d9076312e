//! Repository for the `pins` table: events pinned to the top of the screen
//! for a period of time.

use chrono::Utc;

use crate::db::{SqlExecutor, Timestamp};
use crate::error::DbError;
use crate::model::Pin;

const PINS: &str = "pins";
const PIN_ID: &str = "pin_id";
const EVENT_ID: &str = "event_id";

const SELECT_PINNED_EVENT_IDS: &str =
    "SELECT event_id FROM pins \
    WHERE (NOW() BETWEEN start_at AND end_at) OR (NOW() > start_at AND end_at IS NULL) \
    ORDER BY start_at, pin_id";
const SELECT_PIN: &str =
    "SELECT pin_id AS id, event_id, start_at, end_at FROM pins WHERE pin_id = ?";

#[derive(Clone)]
pub struct PinDb {
    db: SqlExecutor,
}

impl PinDb {
    pub fn new(db: SqlExecutor) -> PinDb {
        PinDb { db }
    }

    /// Events whose pin has started and not yet ended. A pin without an end
    /// stays up until it is deleted.
    pub async fn get_currently_pinned_event_ids(&self) -> Result<Vec<i64>, DbError> {
        let rows: Vec<(i64,)> = self.db.read_all(SELECT_PINNED_EVENT_IDS, vec!()).await?;
        Ok(rows.into_iter().map(|(event_id,)| event_id).collect())
    }

    pub async fn get_pin(&self, pin_id: i64) -> Result<Pin, DbError> {
        self.db.read_one(SELECT_PIN, vec!(pin_id.into()))
            .await?
            .ok_or_else(|| DbError::not_found("pin", pin_id))
    }

    /// Pins the event from `start_at` (now when omitted) until `end_at`
    /// (indefinitely when omitted).
    pub async fn insert_pin(&self, event_id: i64, start_at: Option<Timestamp>, end_at: Option<Timestamp>)
    -> Result<i64, DbError> {
        let start_at = start_at.unwrap_or_else(Utc::now);
        let pin_id: i64 = self.db.create(
            PINS,
            PIN_ID,
            &["event_id", "start_at", "end_at"],
            vec!(event_id.into(), start_at.into(), end_at.into()),
        ).await?;
        debug!("pinned event_id={} as pin_id={}", event_id, pin_id);
        Ok(pin_id)
    }

    /// Moves every pin of the event to the given period, with the same
    /// defaults as [`PinDb::insert_pin`].
    pub async fn update_pin(&self, event_id: i64, start_at: Option<Timestamp>, end_at: Option<Timestamp>)
    -> Result<bool, DbError> {
        let start_at = start_at.unwrap_or_else(Utc::now);
        self.db.update(
            PINS,
            EVENT_ID,
            event_id,
            &["start_at = ?", "end_at = ?"],
            vec!(start_at.into(), end_at.into()),
        ).await
    }

    pub async fn delete_pin(&self, pin_id: i64) -> Result<bool, DbError> {
        self.db.delete(PINS, PIN_ID, pin_id, &[]).await
    }
}
