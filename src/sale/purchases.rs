use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use itertools::Itertools;

use super::cents_to_price;
use crate::db::{SqlExecutor, SqlParam, Timestamp};
use crate::error::DbError;
use crate::model::{ProductSales, Purchase, PurchaseItem, SalesEntry, SalesRow};

const PURCHASES: &str = "purchases";
const PURCHASE_ID: &str = "purchase_id";
const PURCHASE_ITEMS: &str = "purchase_items";
const PURCHASE_ITEM_ID: &str = "purchase_item_id";

const SELECT_PURCHASE: &str =
    "SELECT purchase_id AS id, purchased_at, (price * 100)::bigint AS price_cents \
    FROM purchases WHERE purchase_id = ?";
const SELECT_ITEMS: &str =
    "SELECT purchase_item_id AS id, purchase_id, product_id, quantity, name, \
    (unit_price * 100)::bigint AS unit_price_cents \
    FROM purchase_items WHERE purchase_id = ? ORDER BY purchase_item_id";
const SELECT_PRODUCT_SALES: &str =
    "SELECT i.product_id, (EXTRACT(ISODOW FROM p.purchased_at)::int - 1) AS weekday, \
    SUM(i.quantity)::bigint AS quantity, i.name, (i.unit_price * 100)::bigint AS unit_price_cents \
    FROM purchase_items i JOIN purchases p ON p.purchase_id = i.purchase_id \
    WHERE p.purchased_at >= ? AND p.purchased_at < ? \
    GROUP BY i.product_id, weekday, i.name, i.unit_price \
    ORDER BY i.product_id, weekday, i.name";

#[derive(Clone)]
pub struct PurchaseDb {
    db: SqlExecutor,
}

impl PurchaseDb {
    pub fn new(db: SqlExecutor) -> PurchaseDb {
        PurchaseDb { db }
    }

    /// Records a purchase, made now unless `purchased_at` says otherwise.
    pub async fn add_purchase(&self, purchased_at: Option<Timestamp>, price_cents: Option<i64>)
    -> Result<i64, DbError> {
        let mut fields = vec!("price");
        let mut params: Vec<SqlParam> = vec!(cents_to_price(price_cents).into());
        if let Some(purchased_at) = purchased_at {
            fields.push("purchased_at");
            params.push(purchased_at.into());
        }
        let purchase_id: i64 = self.db.create(PURCHASES, PURCHASE_ID, &fields, params).await?;
        debug!("added purchase_id={}", purchase_id);
        Ok(purchase_id)
    }

    pub async fn get_purchase(&self, purchase_id: i64) -> Result<Purchase, DbError> {
        self.db.read_one(SELECT_PURCHASE, vec!(purchase_id.into()))
            .await?
            .ok_or_else(|| DbError::not_found("purchase", purchase_id))
    }

    /// Items of the purchase go with it.
    pub async fn delete_purchase(&self, purchase_id: i64) -> Result<bool, DbError> {
        self.db.delete(PURCHASES, PURCHASE_ID, purchase_id, &[]).await
    }
}

#[derive(Clone)]
pub struct PurchaseItemDb {
    db: SqlExecutor,
}

impl PurchaseItemDb {
    pub fn new(db: SqlExecutor) -> PurchaseItemDb {
        PurchaseItemDb { db }
    }

    /// Adds a line to a purchase. `name` and `unit_price_cents` record the
    /// product as it was sold, which may differ from the current catalogue.
    pub async fn add_item(&self,
        purchase_id: i64,
        product_id: i64,
        quantity: i64,
        name: Option<&str>,
        unit_price_cents: Option<i64>,
    ) -> Result<i64, DbError> {
        if quantity <= 0 {
            return Err(DbError::InvalidArgument(format!("quantity must be positive, got {}", quantity)));
        }
        let mut fields = vec!("purchase_id", "product_id", "quantity", "unit_price");
        let mut params: Vec<SqlParam> = vec!(
            purchase_id.into(),
            product_id.into(),
            quantity.into(),
            cents_to_price(unit_price_cents).into(),
        );
        if let Some(name) = name {
            fields.push("name");
            params.push(name.into());
        }
        self.db.create(PURCHASE_ITEMS, PURCHASE_ITEM_ID, &fields, params).await
    }

    pub async fn get_items(&self, purchase_id: i64) -> Result<Vec<PurchaseItem>, DbError> {
        self.db.read_all(SELECT_ITEMS, vec!(purchase_id.into())).await
    }

    /// Quantities sold per product per weekday during ISO week `week` of
    /// `year`, in UTC. Sales under a different name or price are kept as
    /// separate entries.
    pub async fn get_product_sales(&self, year: i32, week: u32) -> Result<Vec<ProductSales>, DbError> {
        let (start, end) = week_bounds(year, week)?;
        let rows: Vec<SalesRow> = self.db.read_all(SELECT_PRODUCT_SALES, vec!(start.into(), end.into())).await?;
        Ok(group_sales(rows))
    }
}

/// Start (inclusive) and end (exclusive) of an ISO week.
fn week_bounds(year: i32, week: u32) -> Result<(Timestamp, Timestamp), DbError> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| DbError::InvalidArgument(format!("'{}' is not a valid week.", week)))?;
    let start = Utc.from_utc_datetime(&monday.and_time(NaiveTime::MIN));
    Ok((start, start + Duration::days(7)))
}

/// Folds rows ordered by product into one [`ProductSales`] per product.
fn group_sales(rows: Vec<SalesRow>) -> Vec<ProductSales> {
    let by_product = rows.into_iter().chunk_by(|row| row.product_id);
    by_product.into_iter()
        .map(|(product_id, rows)| ProductSales {
            product_id,
            entries: rows
                .map(|row| SalesEntry {
                    weekday: row.weekday,
                    quantity: row.quantity,
                    name: row.name,
                    unit_price_cents: row.unit_price_cents,
                })
                .collect(),
        })
        .collect()
}
