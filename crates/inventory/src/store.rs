//! Store and transaction contracts consumed by the purchase workflow.
//!
//! These traits are the seam between the inventory domain and persistence.
//! Any backend satisfying them is acceptable; `stockroom-infra` ships an
//! in-memory implementation (tests/dev) and a Postgres one.
//!
//! ## Transaction context
//!
//! A [`TransactionBoundary`] hands out a typed transaction value from
//! [`begin`](TransactionBoundary::begin). Every store operation receives that
//! value explicitly (`&mut Tx`), so all reads and writes issued with the same
//! context are part of one atomic unit. `commit` and `rollback` consume the
//! transaction: once either has been called the context cannot be reused.
//!
//! ## Isolation
//!
//! [`ItemStore::get_by_id`] must isolate the returned row from other
//! transactions until the reading transaction ends (e.g. `SELECT ... FOR
//! UPDATE`, or serializing whole transactions). The purchase workflow relies
//! on this for its read-modify-write of the stock counter; it takes no locks
//! of its own.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::ItemId;

use crate::item::{Item, ItemPatch, NewItem};
use crate::pagination::PageRequest;
use crate::purchase::{NewPurchase, Purchase};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors: any of
/// them makes the current transaction unusable.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (pool closed, acquire timed out).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A concurrent transaction conflicted with this one.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored constraint rejected the write (e.g. stock above total).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// An update targeted a row that does not exist.
    #[error("{entity} {id} does not exist")]
    MissingRow { entity: &'static str, id: i64 },

    /// A stored row could not be turned back into a domain value.
    #[error("failed to decode row: {0}")]
    Decode(String),

    /// Any other backend failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Begin/commit/rollback demarcation around a group of store operations.
#[async_trait]
pub trait TransactionBoundary: Send + Sync {
    /// Active transaction context passed to store operations.
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Make every write issued with `tx` durable.
    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Discard every write issued with `tx`. Best-effort.
    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;
}

/// Durable record of items and their stock counters.
#[async_trait]
pub trait ItemStore<Tx: Send>: Send + Sync {
    /// Insert a new item; id and creation time are assigned here.
    async fn create(&self, tx: &mut Tx, item: NewItem) -> StoreResult<Item>;

    /// Apply a sparse update by primary key. Fields unset in `patch` are not written.
    async fn update(&self, tx: &mut Tx, id: ItemId, patch: ItemPatch) -> StoreResult<()>;

    /// Point lookup. `Ok(None)` means the item does not exist.
    async fn get_by_id(&self, tx: &mut Tx, id: ItemId) -> StoreResult<Option<Item>>;

    /// Items ordered by id. See [`PageRequest`] for the "no pagination" case.
    async fn list(&self, tx: &mut Tx, page: PageRequest) -> StoreResult<Vec<Item>>;
}

/// Append-only purchase log.
#[async_trait]
pub trait PurchaseStore<Tx: Send>: Send + Sync {
    async fn create(&self, tx: &mut Tx, purchase: NewPurchase) -> StoreResult<Purchase>;
}

#[async_trait]
impl<S> TransactionBoundary for Arc<S>
where
    S: TransactionBoundary + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        (**self).begin().await
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        (**self).commit(tx).await
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        (**self).rollback(tx).await
    }
}

#[async_trait]
impl<Tx, S> ItemStore<Tx> for Arc<S>
where
    Tx: Send,
    S: ItemStore<Tx> + ?Sized,
{
    async fn create(&self, tx: &mut Tx, item: NewItem) -> StoreResult<Item> {
        (**self).create(tx, item).await
    }

    async fn update(&self, tx: &mut Tx, id: ItemId, patch: ItemPatch) -> StoreResult<()> {
        (**self).update(tx, id, patch).await
    }

    async fn get_by_id(&self, tx: &mut Tx, id: ItemId) -> StoreResult<Option<Item>> {
        (**self).get_by_id(tx, id).await
    }

    async fn list(&self, tx: &mut Tx, page: PageRequest) -> StoreResult<Vec<Item>> {
        (**self).list(tx, page).await
    }
}

#[async_trait]
impl<Tx, S> PurchaseStore<Tx> for Arc<S>
where
    Tx: Send,
    S: PurchaseStore<Tx> + ?Sized,
{
    async fn create(&self, tx: &mut Tx, purchase: NewPurchase) -> StoreResult<Purchase> {
        (**self).create(tx, purchase).await
    }
}
