//! Repositories over the association's PostgreSQL databases: polls with
//! their options and votes, event pins, RFID card registrations, member
//! birthdays and sales.
//!
//! Every repository takes a [`db::SqlExecutor`] built by the caller, usually
//! through [`config::DbConfig::connect`], and keeps no state of its own
//! between calls.

#[macro_use]
extern crate log;

pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod member;
pub mod model;
pub mod poll;
pub mod sale;
pub mod schema;
pub mod util;

pub use db::{SqlExecutor, SqlParam, Timestamp};
pub use error::{ConstraintKind, DbError};
pub use event::PinDb;
pub use member::{BirthdayDb, RfidDb};
pub use poll::{LogObserver, PollDb, PollReader, PollUpdate, SkipObserver};
pub use sale::{ProductDb, PurchaseDb, PurchaseItemDb};
