//! Inventory domain module.
//!
//! Items, purchases and the purchase workflow. Persistence is reached only
//! through the store and transaction contracts in [`store`]; concrete stores
//! live in `stockroom-infra`.

pub mod error;
pub mod item;
pub mod pagination;
pub mod purchase;
pub mod service;
pub mod store;

pub use error::{FieldViolation, InventoryError, InventoryResult};
pub use item::{CreateItem, Item, ItemPatch, NewItem, SellingPrice};
pub use pagination::{PageRequest, PageWindow};
pub use purchase::{NewPurchase, Purchase, PurchaseRequest};
pub use service::InventoryService;
pub use store::{ItemStore, PurchaseStore, StoreError, StoreResult, TransactionBoundary};
