//! Repositories for the sales database: the product catalogue, purchases
//! and the items on each purchase.
//!
//! Prices are exchanged as integer cents and stored as `NUMERIC(10, 2)`.

mod products;
mod purchases;

pub use products::ProductDb;
pub use purchases::{PurchaseDb, PurchaseItemDb};

/// Storage form of a price in cents.
fn cents_to_price(cents: Option<i64>) -> Option<f64> {
    cents.map(|cents| cents as f64 / 100.0)
}
