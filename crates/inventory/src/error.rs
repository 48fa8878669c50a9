//! Inventory workflow errors.

use thiserror::Error;

use stockroom_core::ItemId;

use crate::store::StoreError;

pub type InventoryResult<T> = Result<T, InventoryError>;

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field as seen by clients.
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure of an inventory operation.
///
/// `NotFound`, `OutOfStock` and `Validation` are business-rule failures: the
/// request itself cannot succeed. `Persistence` wraps an infrastructure
/// failure and says nothing about the request.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("not found item:{0}")]
    NotFound(ItemId),

    #[error(
        "the item out of stock - current quantity:{available} - request quantity:{requested}"
    )]
    OutOfStock {
        item_id: ItemId,
        requested: u64,
        available: u64,
    },

    #[error("{}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl InventoryError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    /// Whether the failure is caused by the request rather than by infrastructure.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, InventoryError::Persistence(_))
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
