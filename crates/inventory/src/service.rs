//! Inventory use cases: create item, list items, buy item.
//!
//! ## Buy-item transaction
//!
//! ```text
//! begin
//!   ↓
//! 1. get item by id (row isolated until the transaction ends)
//!   ↓ missing → NotFound          ─┐
//! 2. check quantity <= current    │
//!   ↓ short → OutOfStock          ├─ rollback, return error
//! 3. update current stock only    │
//!   ↓                             │
//! 4. insert purchase             ─┘
//!   ↓
//! commit → Purchase (store-assigned id + timestamp)
//! ```
//!
//! Correctness under concurrent purchases of the same item comes entirely from
//! the isolation of the [`TransactionBoundary`]. Nothing here locks or retries.

use tracing::{error, info, instrument, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::item::{Item, ItemPatch, NewItem};
use crate::pagination::PageRequest;
use crate::purchase::{NewPurchase, Purchase, PurchaseRequest};
use crate::store::{ItemStore, PurchaseStore, TransactionBoundary};

/// Inventory application service.
///
/// Generic over the transaction boundary and both stores so it can run on any
/// backend (see `stockroom-infra`).
pub struct InventoryService<B, I, P> {
    boundary: B,
    items: I,
    purchases: P,
}

impl<B, I, P> InventoryService<B, I, P> {
    pub fn new(boundary: B, items: I, purchases: P) -> Self {
        Self {
            boundary,
            items,
            purchases,
        }
    }
}

impl<B, I, P> InventoryService<B, I, P>
where
    B: TransactionBoundary,
    I: ItemStore<B::Tx>,
    P: PurchaseStore<B::Tx>,
{
    /// Create an item whose current stock equals its total stock.
    #[instrument(
        skip(self, item),
        fields(total_stock_value = item.total_stock_value, selling_price = %item.selling_price),
        err
    )]
    pub async fn create_item(&self, item: NewItem) -> InventoryResult<Item> {
        let mut tx = self.boundary.begin().await?;
        let created = match self.items.create(&mut tx, item).await {
            Ok(created) => created,
            Err(e) => return Err(self.abort(tx, e.into()).await),
        };
        self.boundary.commit(tx).await?;
        Ok(created)
    }

    /// List items, passing the page request through to the store unchanged.
    #[instrument(skip(self), fields(page = page.page, limit = page.limit), err)]
    pub async fn list_items(&self, page: PageRequest) -> InventoryResult<Vec<Item>> {
        let mut tx = self.boundary.begin().await?;
        let items = match self.items.list(&mut tx, page).await {
            Ok(items) => items,
            Err(e) => {
                warn!(?page, "failed to get items");
                return Err(self.abort(tx, e.into()).await);
            }
        };
        self.boundary.commit(tx).await?;
        Ok(items)
    }

    /// Take `quantity` from an item's current stock and record the purchase.
    ///
    /// Not idempotent: two identical calls make two decrements and two purchases.
    #[instrument(
        skip(self),
        fields(item_id = %request.item_id, quantity = request.quantity)
    )]
    pub async fn buy_item(&self, request: PurchaseRequest) -> InventoryResult<Purchase> {
        if request.quantity == 0 {
            return Err(InventoryError::validation(
                "quantity",
                "'quantity' should be greater than 0",
            ));
        }

        let mut tx = self.boundary.begin().await?;

        let purchase = match self.purchase_within(&mut tx, request).await {
            Ok(purchase) => purchase,
            Err(err) => return Err(self.abort(tx, err).await),
        };

        // A failed commit is reported as-is; the transaction is gone, so no
        // rollback is attempted.
        if let Err(e) = self.boundary.commit(tx).await {
            error!(error = %e, "failed to commit purchase transaction");
            return Err(e.into());
        }

        info!(purchase_id = %purchase.id_typed(), "purchase committed");
        Ok(purchase)
    }

    async fn purchase_within(
        &self,
        tx: &mut B::Tx,
        request: PurchaseRequest,
    ) -> InventoryResult<Purchase> {
        let item = match self.items.get_by_id(tx, request.item_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                info!("not found item");
                return Err(InventoryError::NotFound(request.item_id));
            }
            Err(e) => {
                warn!(error = %e, "failed to get item");
                return Err(e.into());
            }
        };

        let available = item.current_stock_value();
        let Some(remaining) = item.remaining_after(request.quantity) else {
            info!(available, "item out of stock");
            return Err(InventoryError::OutOfStock {
                item_id: request.item_id,
                requested: request.quantity,
                available,
            });
        };

        if let Err(e) = self
            .items
            .update(tx, item.id_typed(), ItemPatch::current_stock(remaining))
            .await
        {
            warn!(error = %e, "failed to update current stock of item");
            return Err(e.into());
        }

        let new_purchase = NewPurchase {
            item_id: request.item_id,
            quantity: request.quantity,
        };
        match self.purchases.create(tx, new_purchase).await {
            Ok(purchase) => Ok(purchase),
            Err(e) => {
                warn!(error = %e, ?new_purchase, "failed to create purchase");
                Err(e.into())
            }
        }
    }

    /// Roll back `tx` and hand back the error that caused it.
    ///
    /// A rollback failure is logged and dropped: the caller needs the
    /// original cause, and the backend discards an unfinished transaction
    /// anyway.
    async fn abort(&self, tx: B::Tx, cause: InventoryError) -> InventoryError {
        info!(error = %cause, "rolling back transaction");
        if let Err(e) = self.boundary.rollback(tx).await {
            warn!(error = %e, "rollback failed");
        }
        cause
    }
}
