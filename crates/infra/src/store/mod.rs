//! Concrete implementations of the inventory store contracts.
//!
//! Both backends implement `TransactionBoundary`, `ItemStore` and
//! `PurchaseStore` on a single type, so one value (usually behind an `Arc`)
//! can be handed to `InventoryService` three times.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryInventoryStore, InMemoryTx};
pub use postgres::{PgTx, PostgresInventoryStore};
