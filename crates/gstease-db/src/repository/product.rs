//! # Product Repository
//!
//! Catalog reads and inserts. Stock levels are never written here: every
//! change to `stock_quantity` goes through [`crate::StockLedger`] so that it
//! lands together with its history row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use gstease_core::validation::{validate_non_negative, validate_product_name};
use gstease_core::{GstRate, Money, Product, ValidationError, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_UNIT};

use crate::error::DbResult;

/// Fields for a new catalog product.
///
/// ## Example
/// ```rust,ignore
/// let widget = NewProduct::new("Widget", Money::from_rupees(100), GstRate::from_bps(1800))
///     .hsn_code("8479")
///     .opening_stock(5);
/// let product = db.products().insert(&widget).await?;
/// ```
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub hsn_code: Option<String>,
    pub unit: String,
    pub price: Money,
    pub gst_rate: GstRate,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money, gst_rate: GstRate) -> Self {
        NewProduct {
            name: name.into(),
            hsn_code: None,
            unit: DEFAULT_UNIT.to_string(),
            price,
            gst_rate,
            stock_quantity: 0,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn hsn_code(mut self, code: impl Into<String>) -> Self {
        self.hsn_code = Some(code.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn opening_stock(mut self, qty: i64) -> Self {
        self.stock_quantity = qty;
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        if self.price.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "price".to_string(),
            });
        }
        if self.gst_rate.bps() > GstRate::MAX_BPS {
            return Err(ValidationError::OutOfRange {
                field: "gstRate".to_string(),
                min: 0,
                max: 100,
            });
        }
        validate_non_negative(self.stock_quantity, "stockQuantity")?;
        validate_non_negative(self.low_stock_threshold, "lowStockThreshold")?;
        Ok(())
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product with its opening stock.
    ///
    /// The opening balance is the ledger's starting point; no history row
    /// is written for it.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            hsn_code: new.hsn_code.clone(),
            unit: new.unit.clone(),
            price_paise: new.price.paise(),
            gst_rate_bps: new.gst_rate.bps(),
            stock_quantity: new.stock_quantity,
            low_stock_threshold: new.low_stock_threshold,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, hsn_code, unit, price_paise, gst_rate_bps,
                stock_quantity, low_stock_threshold, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.hsn_code)
        .bind(&product.unit)
        .bind(product.price_paise)
        .bind(product.gst_rate_bps)
        .bind(product.stock_quantity)
        .bind(product.low_stock_threshold)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, price_paise, gst_rate_bps,
                   stock_quantity, low_stock_threshold, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, price_paise, gst_rate_bps,
                   stock_quantity, low_stock_threshold, created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products at or below their low-stock threshold, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, price_paise, gst_rate_bps,
                   stock_quantity, low_stock_threshold, created_at, updated_at
            FROM products
            WHERE stock_quantity <= low_stock_threshold
            ORDER BY stock_quantity, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Low-stock products");
        Ok(products)
    }

    /// Number of products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let inserted = repo
            .insert(
                &NewProduct::new("Widget", Money::from_rupees(100), GstRate::from_bps(1800))
                    .hsn_code("8479")
                    .opening_stock(5),
            )
            .await
            .unwrap();

        let fetched = repo.get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.price().paise(), 10_000);
        assert_eq!(fetched.gst_rate().bps(), 1800);
        assert_eq!(fetched.stock_quantity, 5);
        assert_eq!(fetched.unit, "pcs");
        assert_eq!(fetched.low_stock_threshold, 10);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .products()
            .insert(&NewProduct::new("Widget", Money::zero(), GstRate::zero()).opening_stock(-1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        for (name, stock) in [("Plenty", 50), ("Edge", 10), ("Empty", 0)] {
            repo.insert(&NewProduct::new(name, Money::from_rupees(1), GstRate::zero()).opening_stock(stock))
                .await
                .unwrap();
        }

        let low: Vec<String> = repo.low_stock().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(low, vec!["Empty".to_string(), "Edge".to_string()]);
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }
}
