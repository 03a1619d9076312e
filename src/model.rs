use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Timestamp;

/// A fully assembled poll: its row plus every option and every vote cast on
/// those options.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    pub published_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub options: Vec<PollOption>,
}

impl Poll {
    /// Total votes on the poll, summed over its options.
    pub fn vote_count(&self) -> usize {
        self.options.iter().map(PollOption::vote_count).sum()
    }

    pub fn option(&self, option_id: i64) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Expiry is advisory: it filters reads, it does not block writes.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub votes: Vec<Vote>,
}

impl PollOption {
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Vote {
    pub id: i64,
    pub poll_id: i64,
    pub option_id: i64,
    pub user_id: i64,
    pub published_at: Timestamp,
}

#[derive(sqlx::FromRow, Debug, Clone, Eq, PartialEq)]
pub(crate) struct PollRow {
    pub id: i64,
    pub question: String,
    pub published_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

#[derive(sqlx::FromRow, Debug, Clone, Eq, PartialEq)]
pub(crate) struct OptionRow {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
}

impl OptionRow {
    pub fn with_votes(self, votes: Vec<Vote>) -> PollOption {
        PollOption {
            id: self.id,
            poll_id: self.poll_id,
            text: self.text,
            votes,
        }
    }
}

impl PollRow {
    pub fn with_options(self, options: Vec<PollOption>) -> Poll {
        Poll {
            id: self.id,
            question: self.question,
            published_at: self.published_at,
            expires_at: self.expires_at,
            options,
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Pin {
    pub id: i64,
    pub event_id: i64,
    pub start_at: Timestamp,
    pub end_at: Option<Timestamp>,
}

#[derive(sqlx::FromRow, Debug, Clone, Eq, PartialEq)]
pub struct ActivationTokenInfo {
    pub hashed_activation_token: String,
    pub activation_token_valid_until: Timestamp,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit_price_cents: Option<i64>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Purchase {
    pub id: i64,
    pub purchased_at: Option<Timestamp>,
    pub price_cents: Option<i64>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PurchaseItem {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
}

/// Sales of one product within one ISO week.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct ProductSales {
    pub product_id: i64,
    pub entries: Vec<SalesEntry>,
}

impl ProductSales {
    pub fn total_quantity(&self) -> i64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    pub fn quantity_on(&self, weekday: i32) -> i64 {
        self.entries.iter()
            .filter(|e| e.weekday == weekday)
            .map(|e| e.quantity)
            .sum()
    }
}

/// Quantity sold on one weekday (0 = Monday) under one name and price.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct SalesEntry {
    pub weekday: i32,
    pub quantity: i64,
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
}

#[derive(sqlx::FromRow, Debug, Clone, Eq, PartialEq)]
pub(crate) struct SalesRow {
    pub product_id: i64,
    pub weekday: i32,
    pub quantity: i64,
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
}

#[derive(sqlx::FromRow, Debug, Clone, Eq, PartialEq)]
pub struct Birthday {
    pub id: i64,
    pub member_id: i64,
    pub date_of_birth: NaiveDate,
}
