use crate::db::{SqlExecutor, Timestamp};
use crate::error::DbError;
use crate::model::ActivationTokenInfo;

const RFID: &str = "rfid";
const CARD_ID: &str = "card_id";
const MEMBER_ID: &str = "congressus_member_id";

const SELECT_MEMBER_ID: &str = "SELECT congressus_member_id FROM rfid WHERE card_id = ?";
const IS_REGISTERED: &str = "SELECT EXISTS (SELECT 1 FROM rfid WHERE card_id = ?)";
const IS_ACTIVATED: &str =
    "SELECT EXISTS (SELECT 1 FROM rfid WHERE card_id = ? AND is_email_confirmed = TRUE)";
const SELECT_ACTIVATION_TOKEN: &str =
    "SELECT hashed_activation_token, activation_token_valid_until FROM rfid WHERE card_id = ?";

#[derive(sqlx::FromRow)]
struct TokenRow {
    hashed_activation_token: Option<String>,
    activation_token_valid_until: Option<Timestamp>,
}

/// Registrations of RFID cards to Congressus members. A card only counts as
/// activated once the member confirmed the registration by email.
#[derive(Clone)]
pub struct RfidDb {
    db: SqlExecutor,
}

impl RfidDb {
    pub fn new(db: SqlExecutor) -> RfidDb {
        RfidDb { db }
    }

    /// Fails with `NotFound` when the card is not registered to a member.
    pub async fn get_congressus_member_id_from_card_id(&self, card_id: &str) -> Result<i64, DbError> {
        let row: Option<(i64,)> = self.db.read_one(SELECT_MEMBER_ID, vec!(card_id.into())).await?;
        match row {
            Some((member_id,)) if member_id != 0 => Ok(member_id),
            _ => Err(DbError::not_found("card", card_id)),
        }
    }

    pub async fn is_rfid_card_registered(&self, card_id: &str) -> Result<bool, DbError> {
        self.exists(IS_REGISTERED, card_id).await
    }

    pub async fn is_rfid_card_activated(&self, card_id: &str) -> Result<bool, DbError> {
        self.exists(IS_ACTIVATED, card_id).await
    }

    /// The pending activation token of the card. Activated cards no longer
    /// have one and fail with `NotFound`, as do unknown cards.
    pub async fn get_activation_token_info(&self, card_id: &str) -> Result<ActivationTokenInfo, DbError> {
        let row: Option<TokenRow> = self.db.read_one(SELECT_ACTIVATION_TOKEN, vec!(card_id.into())).await?;
        match row {
            Some(TokenRow {
                hashed_activation_token: Some(hashed_activation_token),
                activation_token_valid_until: Some(activation_token_valid_until),
            }) => Ok(ActivationTokenInfo { hashed_activation_token, activation_token_valid_until }),
            _ => Err(DbError::not_found("activation token", card_id)),
        }
    }

    /// Registers the card and returns its id. Registering a card twice fails
    /// with a unique constraint violation.
    pub async fn insert_rfid(&self,
        card_id: &str,
        congressus_member_id: i64,
        hashed_activation_token: &str,
        activation_token_valid_until: Timestamp,
        is_email_confirmed: bool,
    ) -> Result<String, DbError> {
        if card_id.is_empty() {
            return Err(DbError::InvalidArgument("card id must not be empty".to_owned()));
        }
        let card_id: String = self.db.create(
            RFID,
            CARD_ID,
            &[
                "card_id",
                "congressus_member_id",
                "hashed_activation_token",
                "activation_token_valid_until",
                "is_email_confirmed",
            ],
            vec!(
                card_id.into(),
                congressus_member_id.into(),
                hashed_activation_token.into(),
                activation_token_valid_until.into(),
                is_email_confirmed.into(),
            ),
        ).await?;
        info!("registered card_id={} to member_id={}", card_id, congressus_member_id);
        Ok(card_id)
    }

    /// Confirms the registration and discards its activation token.
    pub async fn activate_card(&self, card_id: &str) -> Result<bool, DbError> {
        self.db.update(
            RFID,
            CARD_ID,
            card_id,
            &[
                "is_email_confirmed = TRUE",
                "hashed_activation_token = NULL",
                "activation_token_valid_until = NULL",
            ],
            vec!(),
        ).await
    }

    pub async fn update_last_used_at(&self, card_id: &str) -> Result<bool, DbError> {
        self.db.update(RFID, CARD_ID, card_id, &["last_used_at = NOW()"], vec!()).await
    }

    /// Removes the member's activated cards; pending registrations stay.
    pub async fn delete_members_activated_registrations(&self, congressus_member_id: i64) -> Result<bool, DbError> {
        self.db.delete(RFID, MEMBER_ID, congressus_member_id, &["is_email_confirmed = TRUE"]).await
    }

    pub async fn delete_members_rfid_registrations(&self, congressus_member_id: i64) -> Result<bool, DbError> {
        self.db.delete(RFID, MEMBER_ID, congressus_member_id, &[]).await
    }

    async fn exists(&self, sql: &str, card_id: &str) -> Result<bool, DbError> {
        let row: Option<(bool,)> = self.db.read_one(sql, vec!(card_id.into())).await?;
        Ok(row.map_or(false, |(exists,)| exists))
    }
}
