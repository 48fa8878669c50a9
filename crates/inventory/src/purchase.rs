use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId, PurchaseId};

/// Immutable record of stock taken from one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    id: PurchaseId,
    created_at: DateTime<Utc>,
    item_id: ItemId,
    quantity: u64,
}

impl Purchase {
    pub fn restore(
        id: PurchaseId,
        created_at: DateTime<Utc>,
        item_id: ItemId,
        quantity: u64,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::invariant(format!(
                "purchase {id}: quantity must be at least 1"
            )));
        }
        Ok(Self {
            id,
            created_at,
            item_id,
            quantity,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    /// When the purchase was recorded ("bought at").
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Purchase row to insert; id and timestamp come from the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub item_id: ItemId,
    pub quantity: u64,
}

/// Buy-item request handed to the workflow by the presentation layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: ItemId,
    pub quantity: u64,
}
