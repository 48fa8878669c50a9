use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::ItemId;
use stockroom_inventory::{
    CreateItem, FieldViolation, InventoryError, Item, PageRequest, Purchase, PurchaseRequest,
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 1;

// -------------------------
// Request DTOs
// -------------------------

/// Missing fields deserialize to zero and are then rejected by validation.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub total_stock_value: u64,
    #[serde(default)]
    pub selling_price: Decimal,
}

impl From<CreateItemRequest> for CreateItem {
    fn from(req: CreateItemRequest) -> Self {
        CreateItem {
            total_stock_value: req.total_stock_value,
            selling_price: req.selling_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuyItemRequest {
    #[serde(default)]
    pub quantity: u64,
}

impl BuyItemRequest {
    pub fn into_purchase(self, item_id: ItemId) -> PurchaseRequest {
        PurchaseRequest {
            item_id,
            quantity: self.quantity,
        }
    }
}

/// Raw `?page=&limit=` query. Values are parsed by hand so that bad input maps
/// to the right error code instead of a generic rejection.
#[derive(Debug, Default)]
pub struct ListItemsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListItemsQuery {
    /// Collect `page` and `limit` from decoded query pairs. The first value of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// Resolve defaults and reject non-integer or non-positive values.
    pub fn into_page_request(self) -> Result<PageRequest, InventoryError> {
        let page = parse_positive("page", self.page.as_deref(), DEFAULT_PAGE)?;
        let limit = parse_positive("limit", self.limit.as_deref(), DEFAULT_LIMIT)?;

        let mut violations = Vec::new();
        if page < 1 {
            violations.push(FieldViolation::new("page", "'page' should be greater than 0"));
        }
        if limit < 1 {
            violations.push(FieldViolation::new("limit", "'limit' should be greater than 0"));
        }
        if !violations.is_empty() {
            return Err(InventoryError::Validation(violations));
        }

        Ok(PageRequest::new(page, limit))
    }
}

fn parse_positive(
    field: &'static str,
    raw: Option<&str>,
    default: i64,
) -> Result<i64, InventoryError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse::<i64>().map_err(|_| {
            InventoryError::validation(
                field,
                format!("'{field}' should be an integer and greater than 0"),
            )
        }),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemResponse {
    pub id: i64,
    pub placed_at: i64,
    pub total_stock_value: u64,
    pub current_stock_value: u64,
    pub selling_price: String,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id_typed().get(),
            placed_at: item.created_at().timestamp(),
            total_stock_value: item.total_stock_value(),
            current_stock_value: item.current_stock_value(),
            selling_price: item.selling_price().amount().normalize().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseResponse {
    pub id: i64,
    pub item_id: i64,
    pub quantity: u64,
    pub bought_at: i64,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id_typed().get(),
            item_id: purchase.item_id().get(),
            quantity: purchase.quantity(),
            bought_at: purchase.created_at().timestamp(),
        }
    }
}
