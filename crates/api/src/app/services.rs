use std::sync::Arc;

use tracing::info;

use stockroom_infra::config::StorageConfig;
use stockroom_infra::store::{InMemoryInventoryStore, PostgresInventoryStore};
use stockroom_inventory::{
    InventoryResult, InventoryService, Item, NewItem, PageRequest, Purchase, PurchaseRequest,
    StoreResult,
};

pub type InMemoryInventory = InventoryService<
    Arc<InMemoryInventoryStore>,
    Arc<InMemoryInventoryStore>,
    Arc<InMemoryInventoryStore>,
>;

pub type PostgresInventory = InventoryService<
    Arc<PostgresInventoryStore>,
    Arc<PostgresInventoryStore>,
    Arc<PostgresInventoryStore>,
>;

/// Inventory service bound to the configured backend.
pub enum AppServices {
    InMemory {
        inventory: InMemoryInventory,
        store: Arc<InMemoryInventoryStore>,
    },
    Postgres {
        inventory: PostgresInventory,
        store: Arc<PostgresInventoryStore>,
    },
}

/// Build services for the configured storage backend.
///
/// Postgres stores are connected and migrated before this returns.
pub async fn build_services(storage: &StorageConfig) -> StoreResult<AppServices> {
    match storage {
        StorageConfig::InMemory => {
            info!("using in-memory stores");
            Ok(AppServices::in_memory())
        }
        StorageConfig::Postgres(db) => {
            info!(
                max_connections = db.max_connections,
                min_connections = db.min_connections,
                "using postgres stores"
            );
            let store = PostgresInventoryStore::connect(db).await?;
            store.migrate().await?;
            Ok(AppServices::postgres(Arc::new(store)))
        }
    }
}

impl AppServices {
    pub fn in_memory() -> Self {
        let store = InMemoryInventoryStore::arc();
        Self::InMemory {
            inventory: InventoryService::new(store.clone(), store.clone(), store.clone()),
            store,
        }
    }

    pub fn postgres(store: Arc<PostgresInventoryStore>) -> Self {
        Self::Postgres {
            inventory: InventoryService::new(store.clone(), store.clone(), store.clone()),
            store,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::InMemory { .. } => "in_memory",
            Self::Postgres { .. } => "postgres",
        }
    }

    pub async fn create_item(&self, item: NewItem) -> InventoryResult<Item> {
        match self {
            Self::InMemory { inventory, .. } => inventory.create_item(item).await,
            Self::Postgres { inventory, .. } => inventory.create_item(item).await,
        }
    }

    pub async fn list_items(&self, page: PageRequest) -> InventoryResult<Vec<Item>> {
        match self {
            Self::InMemory { inventory, .. } => inventory.list_items(page).await,
            Self::Postgres { inventory, .. } => inventory.list_items(page).await,
        }
    }

    pub async fn buy_item(&self, request: PurchaseRequest) -> InventoryResult<Purchase> {
        match self {
            Self::InMemory { inventory, .. } => inventory.buy_item(request).await,
            Self::Postgres { inventory, .. } => inventory.buy_item(request).await,
        }
    }

    /// Release backend resources. Postgres waits for pooled connections to return.
    pub async fn shutdown(&self) {
        match self {
            Self::InMemory { .. } => {}
            Self::Postgres { store, .. } => store.close().await,
        }
    }
}
