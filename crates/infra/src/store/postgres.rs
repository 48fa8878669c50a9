//! Postgres-backed inventory store.
//!
//! Each transaction is a `sqlx::Transaction` checked out from the pool.
//! [`ItemStore::get_by_id`] reads with `SELECT ... FOR UPDATE`, so the row
//! stays locked until the reading transaction commits or rolls back and
//! concurrent purchases of the same item are applied one after another.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Conflict` |
//! | Database (foreign key / check violation) | `23503` / `23514` | `Constraint` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Database` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_core::{ItemId, PurchaseId};
use stockroom_inventory::{
    Item, ItemPatch, ItemStore, NewItem, NewPurchase, PageRequest, Purchase, PurchaseStore,
    SellingPrice, StoreError, StoreResult, TransactionBoundary,
};

use crate::config::DatabaseConfig;

/// Active Postgres transaction.
pub type PgTx = Transaction<'static, Postgres>;

const SCHEMA: &str = include_str!("schema.sql");

const ITEM_COLUMNS: &str =
    "id, created_at, total_stock_value, current_stock_value, selling_price";

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool sized by `config`.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TransactionBoundary for PostgresInventoryStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn commit(&self, tx: PgTx) -> StoreResult<()> {
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(&self, tx: PgTx) -> StoreResult<()> {
        tx.rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

#[async_trait]
impl ItemStore<PgTx> for PostgresInventoryStore {
    #[instrument(
        skip(self, tx),
        fields(operation = "create_item", total_stock_value = item.total_stock_value),
        err
    )]
    async fn create(&self, tx: &mut PgTx, item: NewItem) -> StoreResult<Item> {
        let total = to_db_count("total_stock_value", item.total_stock_value)?;
        let current = to_db_count("current_stock_value", item.initial_stock())?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (total_stock_value, current_stock_value, selling_price)
            VALUES ($1, $2, $3)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(total)
        .bind(current)
        .bind(item.selling_price.amount())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        item_from_row(&row)
    }

    #[instrument(skip(self, tx), fields(operation = "update_item", item_id = %id), err)]
    async fn update(&self, tx: &mut PgTx, id: ItemId, patch: ItemPatch) -> StoreResult<()> {
        let Some(current) = patch.current_stock_value else {
            return Ok(());
        };
        let current = to_db_count("current_stock_value", current)?;

        let result = sqlx::query(
            r#"
            UPDATE items
            SET current_stock_value = $2, updated_at = NOW()
            WHERE id = $1 AND $2 <= total_stock_value
            "#,
        )
        .bind(id.get())
        .bind(current)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or the new value exceeds total stock.
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total_stock_value FROM items WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("update_item", e))?;

        match total {
            Some(total) => Err(StoreError::Constraint(format!(
                "item {id}: current stock {current} exceeds total stock {total}"
            ))),
            None => Err(StoreError::MissingRow {
                entity: "item",
                id: id.get(),
            }),
        }
    }

    #[instrument(skip(self, tx), fields(operation = "get_item", item_id = %id), err)]
    async fn get_by_id(&self, tx: &mut PgTx, id: ItemId) -> StoreResult<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self, tx), fields(operation = "list_items", page = page.page, limit = page.limit), err)]
    async fn list(&self, tx: &mut PgTx, page: PageRequest) -> StoreResult<Vec<Item>> {
        let rows = match page.window() {
            Some(window) => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items ORDER BY id LIMIT $1 OFFSET $2"
                ))
                .bind(window.limit)
                .bind(window.offset)
                .fetch_all(&mut **tx)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
                    .fetch_all(&mut **tx)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }
}

#[async_trait]
impl PurchaseStore<PgTx> for PostgresInventoryStore {
    #[instrument(
        skip(self, tx),
        fields(operation = "create_purchase", item_id = %purchase.item_id, quantity = purchase.quantity),
        err
    )]
    async fn create(&self, tx: &mut PgTx, purchase: NewPurchase) -> StoreResult<Purchase> {
        let quantity = to_db_count("quantity", purchase.quantity)?;

        let row = sqlx::query(
            r#"
            INSERT INTO purchases (item_id, quantity)
            VALUES ($1, $2)
            RETURNING id, created_at, item_id, quantity
            "#,
        )
        .bind(purchase.item_id.get())
        .bind(quantity)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("create_purchase", e))?;

        purchase_from_row(&row)
    }
}

fn item_from_row(row: &PgRow) -> StoreResult<Item> {
    let id: i64 = get_column(row, "id")?;
    let created_at: DateTime<Utc> = get_column(row, "created_at")?;
    let total: i64 = get_column(row, "total_stock_value")?;
    let current: i64 = get_column(row, "current_stock_value")?;
    let price: Decimal = get_column(row, "selling_price")?;

    let selling_price = SellingPrice::new(price)
        .map_err(|e| StoreError::Decode(format!("item {id}: {e}")))?;

    Item::restore(
        ItemId::new(id),
        created_at,
        from_db_count("total_stock_value", total)?,
        from_db_count("current_stock_value", current)?,
        selling_price,
    )
    .map_err(|e| StoreError::Decode(e.to_string()))
}

fn purchase_from_row(row: &PgRow) -> StoreResult<Purchase> {
    let id: i64 = get_column(row, "id")?;
    let created_at: DateTime<Utc> = get_column(row, "created_at")?;
    let item_id: i64 = get_column(row, "item_id")?;
    let quantity: i64 = get_column(row, "quantity")?;

    Purchase::restore(
        PurchaseId::new(id),
        created_at,
        ItemId::new(item_id),
        from_db_count("quantity", quantity)?,
    )
    .map_err(|e| StoreError::Decode(e.to_string()))
}

fn get_column<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Decode(format!("failed to read {column}: {e}")))
}

fn to_db_count(column: &str, value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::Constraint(format!("{column} {value} does not fit in BIGINT")))
}

fn from_db_count(column: &str, value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::Decode(format!("{column} is negative: {value}")))
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => StoreError::Unavailable(format!(
            "timed out acquiring a connection in {}",
            operation
        )),
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
