use super::cents_to_price;
use crate::db::{self, SqlExecutor};
use crate::error::DbError;
use crate::model::Product;
use crate::util;

const UPSERT_PRODUCT: &str =
    "INSERT INTO products (product_id, product_name, unit_price) VALUES (?, ?, ?) \
    ON CONFLICT (product_id) DO UPDATE \
    SET product_name = EXCLUDED.product_name, unit_price = EXCLUDED.unit_price";
const SELECT_PRODUCT: &str =
    "SELECT product_id AS id, product_name AS name, (unit_price * 100)::bigint AS unit_price_cents \
    FROM products WHERE product_id = ?";
const SELECT_PRODUCTS: &str =
    "SELECT product_id AS id, product_name AS name, (unit_price * 100)::bigint AS unit_price_cents \
    FROM products ORDER BY product_id";

/// The product catalogue, mirrored from the point of sale.
#[derive(Clone)]
pub struct ProductDb {
    db: SqlExecutor,
}

impl ProductDb {
    pub fn new(db: SqlExecutor) -> ProductDb {
        ProductDb { db }
    }

    /// Inserts new products and overwrites the name and price of known
    /// ones, all in one transaction: either every product is written or
    /// none is.
    pub async fn upsert_products(&self, products: &[Product]) -> Result<(), DbError> {
        if let Some(id) = util::first_duplicate(products.iter().map(|p| p.id)) {
            return Err(DbError::InvalidArgument(format!("product {} is listed more than once", id)));
        }
        if let Some(product) = products.iter().find(|p| p.id <= 0) {
            return Err(DbError::InvalidArgument(format!("product id must be positive, got {}", product.id)));
        }
        if products.is_empty() {
            return Ok(());
        }

        let timeout = self.db.round_trip_timeout();
        let mut tx = self.db.begin().await?;
        for product in products {
            db::bounded(timeout, db::execute(
                &mut *tx,
                UPSERT_PRODUCT,
                vec!(
                    product.id.into(),
                    product.name.as_str().into(),
                    cents_to_price(product.unit_price_cents).into(),
                ),
            )).await?;
        }
        db::bounded(timeout, async {
            tx.commit().await.map_err(DbError::from)
        }).await?;

        info!("upserted {} products", products.len());
        Ok(())
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Product, DbError> {
        self.db.read_one(SELECT_PRODUCT, vec!(product_id.into()))
            .await?
            .ok_or_else(|| DbError::not_found("product", product_id))
    }

    pub async fn get_products(&self) -> Result<Vec<Product>, DbError> {
        self.db.read_all(SELECT_PRODUCTS, vec!()).await
    }
}
