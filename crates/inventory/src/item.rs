use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId, ValueObject};

use crate::error::FieldViolation;

/// Maximum number of fractional digits a selling price may carry.
pub const PRICE_MAX_SCALE: u32 = 2;

/// Whole units a selling price must stay below; matches the `NUMERIC(20, 2)` column.
pub const PRICE_CEILING: i64 = 1_000_000_000_000_000_000;

/// Selling price of an item: a positive decimal below [`PRICE_CEILING`] with at
/// most two fractional digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SellingPrice(Decimal);

impl SellingPrice {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("selling price must be greater than zero"));
        }
        if amount >= Decimal::from(PRICE_CEILING) {
            return Err(DomainError::validation(format!(
                "selling price must be less than {PRICE_CEILING}"
            )));
        }
        // `1.50` and `1.5` are the same price; only significant digits count.
        if amount.normalize().scale() > PRICE_MAX_SCALE {
            return Err(DomainError::validation(format!(
                "selling price cannot have more than {PRICE_MAX_SCALE} decimal places"
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for SellingPrice {}

impl TryFrom<Decimal> for SellingPrice {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SellingPrice> for Decimal {
    fn from(value: SellingPrice) -> Self {
        value.0
    }
}

impl core::fmt::Display for SellingPrice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A stocked, sellable unit.
///
/// Identity and creation time are assigned by the store. Only the current
/// stock value ever changes after creation, and only through a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    created_at: DateTime<Utc>,
    total_stock_value: u64,
    current_stock_value: u64,
    selling_price: SellingPrice,
}

impl Item {
    /// Rebuild an item from stored fields, checking `current <= total`.
    pub fn restore(
        id: ItemId,
        created_at: DateTime<Utc>,
        total_stock_value: u64,
        current_stock_value: u64,
        selling_price: SellingPrice,
    ) -> DomainResult<Self> {
        if current_stock_value > total_stock_value {
            return Err(DomainError::invariant(format!(
                "item {id}: current stock {current_stock_value} exceeds total stock {total_stock_value}"
            )));
        }
        Ok(Self {
            id,
            created_at,
            total_stock_value,
            current_stock_value,
            selling_price,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn total_stock_value(&self) -> u64 {
        self.total_stock_value
    }

    pub fn current_stock_value(&self) -> u64 {
        self.current_stock_value
    }

    pub fn selling_price(&self) -> SellingPrice {
        self.selling_price
    }

    /// Stock left after taking `quantity`, or `None` if not enough is available.
    pub fn remaining_after(&self, quantity: u64) -> Option<u64> {
        self.current_stock_value.checked_sub(quantity)
    }

    /// Return a copy with `patch` applied.
    pub fn patched(&self, patch: ItemPatch) -> DomainResult<Self> {
        let current = patch
            .current_stock_value
            .unwrap_or(self.current_stock_value);
        Self::restore(
            self.id,
            self.created_at,
            self.total_stock_value,
            current,
            self.selling_price,
        )
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Sparse update of an item.
///
/// Only fields listed here may be changed after creation; unset fields are
/// left untouched by the store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub current_stock_value: Option<u64>,
}

impl ItemPatch {
    pub fn current_stock(value: u64) -> Self {
        Self {
            current_stock_value: Some(value),
        }
    }
}

/// Unvalidated item creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub total_stock_value: u64,
    pub selling_price: Decimal,
}

impl CreateItem {
    /// Validate every field, reporting all violations at once.
    pub fn validate(self) -> Result<NewItem, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if self.total_stock_value < 1 {
            violations.push(FieldViolation::new(
                "total_stock_value",
                "'total_stock_value' should be greater than 0",
            ));
        }

        let selling_price = match SellingPrice::new(self.selling_price) {
            Ok(price) => Some(price),
            Err(_) => {
                violations.push(FieldViolation::new(
                    "selling_price",
                    "'selling_price' should be a positive decimal value to two decimal places",
                ));
                None
            }
        };

        match selling_price {
            Some(selling_price) if violations.is_empty() => Ok(NewItem {
                total_stock_value: self.total_stock_value,
                selling_price,
            }),
            _ => Err(violations),
        }
    }
}

/// Validated item ready to be inserted. Current stock starts equal to total stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub total_stock_value: u64,
    pub selling_price: SellingPrice,
}

impl NewItem {
    pub fn initial_stock(&self) -> u64 {
        self.total_stock_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn price(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(current: u64, total: u64) -> Item {
        Item::restore(
            ItemId::new(1),
            Utc::now(),
            total,
            current,
            SellingPrice::new(price("9.99")).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn selling_price_accepts_two_decimal_places() {
        assert!(SellingPrice::new(price("1.55")).is_ok());
        assert!(SellingPrice::new(price("10")).is_ok());
        assert!(SellingPrice::new(price("1.500")).is_ok());
    }

    #[test]
    fn selling_price_rejects_zero_negative_and_fine_fractions() {
        assert!(SellingPrice::new(price("0")).is_err());
        assert!(SellingPrice::new(price("-1.00")).is_err());
        assert!(SellingPrice::new(price("1.555")).is_err());
    }

    #[test]
    fn selling_price_must_fit_the_price_column() {
        assert!(SellingPrice::new(price("999999999999999999.99")).is_ok());
        assert!(SellingPrice::new(price("1000000000000000000")).is_err());
        assert!(SellingPrice::new(price("1000000000000000000000")).is_err());
    }

    #[test]
    fn oversized_price_is_a_selling_price_violation() {
        let violations = CreateItem {
            total_stock_value: 1,
            selling_price: price("1000000000000000000000"),
        }
        .validate()
        .unwrap_err();

        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["selling_price"]);
    }

    #[test]
    fn selling_price_deserializes_from_string_and_number() {
        let p: SellingPrice = serde_json::from_str("\"2.50\"").unwrap();
        assert_eq!(p.amount(), price("2.50"));
        let p: SellingPrice = serde_json::from_str("3").unwrap();
        assert_eq!(p.amount(), price("3"));
        assert!(serde_json::from_str::<SellingPrice>("\"0.001\"").is_err());
    }

    #[test]
    fn restore_rejects_current_above_total() {
        let err = Item::restore(
            ItemId::new(3),
            Utc::now(),
            2,
            5,
            SellingPrice::new(price("1")).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn remaining_after_checks_availability() {
        let it = item(5, 5);
        assert_eq!(it.remaining_after(2), Some(3));
        assert_eq!(it.remaining_after(5), Some(0));
        assert_eq!(it.remaining_after(6), None);
    }

    #[test]
    fn patch_only_touches_current_stock() {
        let it = item(5, 5);
        let patched = it.patched(ItemPatch::current_stock(3)).unwrap();
        assert!(patched.same_record(&it));
        assert_eq!(patched.current_stock_value(), 3);
        assert_eq!(patched.total_stock_value(), 5);
        assert_eq!(patched.selling_price(), it.selling_price());
        assert_eq!(patched.created_at(), it.created_at());

        assert_eq!(it.patched(ItemPatch::default()).unwrap(), it);
    }

    #[test]
    fn create_item_reports_all_violations() {
        let violations = CreateItem {
            total_stock_value: 0,
            selling_price: price("1.234"),
        }
        .validate()
        .unwrap_err();

        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["total_stock_value", "selling_price"]);
    }

    #[test]
    fn create_item_starts_with_full_stock() {
        let new_item = CreateItem {
            total_stock_value: 5,
            selling_price: price("1.50"),
        }
        .validate()
        .unwrap();
        assert_eq!(new_item.initial_stock(), 5);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: any positive amount expressed in cents is a valid price.
            #[test]
            fn cents_are_valid_prices(cents in 1i64..10_000_000) {
                let amount = Decimal::new(cents, 2);
                prop_assert!(SellingPrice::new(amount).is_ok());
            }

            /// Property: sub-cent fractions are always rejected.
            #[test]
            fn sub_cent_prices_are_rejected(mills in 1i64..10_000_000) {
                prop_assume!(mills % 10 != 0);
                let amount = Decimal::new(mills, 3);
                prop_assert!(SellingPrice::new(amount).is_err());
            }

            /// Property: whole amounts at or above the ceiling are always rejected.
            #[test]
            fn prices_at_or_above_ceiling_are_rejected(extra in 0i64..1_000_000_000, cents in 0i64..100) {
                let amount = Decimal::from(PRICE_CEILING) + Decimal::from(extra) + Decimal::new(cents, 2);
                prop_assert!(SellingPrice::new(amount).is_err());
            }

            /// Property: taking stock never goes negative and never exceeds what is available.
            #[test]
            fn remaining_never_negative(current in 0u64..1_000, quantity in 1u64..2_000) {
                let it = item(current, 1_000);
                match it.remaining_after(quantity) {
                    Some(left) => prop_assert_eq!(left + quantity, current),
                    None => prop_assert!(quantity > current),
                }
            }
        }
    }
}
