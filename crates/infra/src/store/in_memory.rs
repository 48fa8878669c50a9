use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_core::{ItemId, PurchaseId};
use stockroom_inventory::{
    Item, ItemPatch, ItemStore, NewItem, NewPurchase, PageRequest, Purchase, PurchaseStore,
    StoreError, StoreResult, TransactionBoundary,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    items: BTreeMap<ItemId, Item>,
    purchases: Vec<Purchase>,
    last_item_id: i64,
    last_purchase_id: i64,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Transactions are fully serialized: `begin` takes
/// an exclusive lock on all tables and holds it until commit or rollback, so
/// every transaction sees the effects of all previously committed ones and
/// nothing else. Writes go to a private working copy that replaces the tables
/// only on commit; dropping an unfinished transaction discards them.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: Arc<Mutex<Tables>>,
}

/// Active in-memory transaction.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Committed purchases, oldest first.
    pub async fn purchases(&self) -> Vec<Purchase> {
        self.tables.lock().await.purchases.clone()
    }

    /// Committed state of one item.
    pub async fn item(&self, id: ItemId) -> Option<Item> {
        self.tables.lock().await.items.get(&id).cloned()
    }

    fn owns(&self, tx: &InMemoryTx) -> bool {
        Arc::ptr_eq(OwnedMutexGuard::mutex(&tx.guard), &self.tables)
    }
}

#[async_trait]
impl TransactionBoundary for InMemoryInventoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> StoreResult<InMemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(InMemoryTx { guard, work })
    }

    async fn commit(&self, tx: InMemoryTx) -> StoreResult<()> {
        if !self.owns(&tx) {
            return Err(StoreError::Conflict(
                "transaction was started by another store".to_string(),
            ));
        }
        let InMemoryTx { mut guard, work } = tx;
        *guard = work;
        Ok(())
    }

    async fn rollback(&self, tx: InMemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }
}

#[async_trait]
impl ItemStore<InMemoryTx> for InMemoryInventoryStore {
    async fn create(&self, tx: &mut InMemoryTx, item: NewItem) -> StoreResult<Item> {
        let id = ItemId::new(tx.work.last_item_id + 1);
        let created = Item::restore(
            id,
            Utc::now(),
            item.total_stock_value,
            item.initial_stock(),
            item.selling_price,
        )
        .map_err(|e| StoreError::Constraint(e.to_string()))?;

        tx.work.last_item_id = id.get();
        tx.work.items.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, tx: &mut InMemoryTx, id: ItemId, patch: ItemPatch) -> StoreResult<()> {
        let item = tx.work.items.get_mut(&id).ok_or(StoreError::MissingRow {
            entity: "item",
            id: id.get(),
        })?;
        *item = item
            .patched(patch)
            .map_err(|e| StoreError::Constraint(e.to_string()))?;
        Ok(())
    }

    async fn get_by_id(&self, tx: &mut InMemoryTx, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(tx.work.items.get(&id).cloned())
    }

    async fn list(&self, tx: &mut InMemoryTx, page: PageRequest) -> StoreResult<Vec<Item>> {
        let rows = tx.work.items.values();
        Ok(match page.window() {
            Some(window) => {
                let (start, end) = window.bounds(tx.work.items.len());
                rows.skip(start).take(end - start).cloned().collect()
            }
            None => rows.cloned().collect(),
        })
    }
}

#[async_trait]
impl PurchaseStore<InMemoryTx> for InMemoryInventoryStore {
    async fn create(&self, tx: &mut InMemoryTx, purchase: NewPurchase) -> StoreResult<Purchase> {
        if !tx.work.items.contains_key(&purchase.item_id) {
            return Err(StoreError::Constraint(format!(
                "purchase references unknown item {}",
                purchase.item_id
            )));
        }

        let id = PurchaseId::new(tx.work.last_purchase_id + 1);
        let created = Purchase::restore(id, Utc::now(), purchase.item_id, purchase.quantity)
            .map_err(|e| StoreError::Constraint(e.to_string()))?;

        tx.work.last_purchase_id = id.get();
        tx.work.purchases.push(created.clone());
        Ok(created)
    }
}
