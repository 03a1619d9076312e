//! Repositories for member data: RFID card registrations and the birthdays
//! shown on the screen.

mod birthdays;
mod rfid;

pub use birthdays::BirthdayDb;
pub use rfid::RfidDb;
