//! Integration tests for the purchase workflow over the in-memory store.
//!
//! Tests: InventoryService → TransactionBoundary → ItemStore/PurchaseStore
//!
//! Verifies:
//! - A purchase decrements stock and records exactly one purchase
//! - Failed purchases leave no trace
//! - Concurrent purchases of one item never oversell

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use stockroom_core::ItemId;
    use stockroom_inventory::{
        CreateItem, InventoryError, InventoryService, PageRequest, PurchaseRequest,
    };

    use crate::store::InMemoryInventoryStore;

    type Service = InventoryService<
        Arc<InMemoryInventoryStore>,
        Arc<InMemoryInventoryStore>,
        Arc<InMemoryInventoryStore>,
    >;

    fn service() -> (Arc<InMemoryInventoryStore>, Service) {
        let store = InMemoryInventoryStore::arc();
        let service = InventoryService::new(store.clone(), store.clone(), store.clone());
        (store, service)
    }

    async fn stock_item(service: &Service, total: u64) -> ItemId {
        let new_item = CreateItem {
            total_stock_value: total,
            selling_price: Decimal::new(1999, 2),
        }
        .validate()
        .unwrap();
        service.create_item(new_item).await.unwrap().id_typed()
    }

    fn buy(item_id: ItemId, quantity: u64) -> PurchaseRequest {
        PurchaseRequest { item_id, quantity }
    }

    #[tokio::test]
    async fn purchase_decrements_stock_and_records_purchase() {
        let (store, service) = service();
        let item_id = stock_item(&service, 5).await;

        let purchase = service.buy_item(buy(item_id, 2)).await.unwrap();

        assert_eq!(purchase.item_id(), item_id);
        assert_eq!(purchase.quantity(), 2);
        let item = store.item(item_id).await.unwrap();
        assert_eq!(item.current_stock_value(), 3);
        assert_eq!(item.total_stock_value(), 5);
        assert_eq!(store.purchases().await, vec![purchase]);
    }

    #[tokio::test]
    async fn out_of_stock_leaves_no_trace() {
        let (store, service) = service();
        let item_id = stock_item(&service, 5).await;
        service.buy_item(buy(item_id, 4)).await.unwrap();

        let err = service.buy_item(buy(item_id, 2)).await.unwrap_err();

        assert!(matches!(
            err,
            InventoryError::OutOfStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert_eq!(store.item(item_id).await.unwrap().current_stock_value(), 1);
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let (store, service) = service();
        stock_item(&service, 5).await;

        let err = service.buy_item(buy(ItemId::new(999), 1)).await.unwrap_err();

        assert!(matches!(err, InventoryError::NotFound(id) if id == ItemId::new(999)));
        assert!(store.purchases().await.is_empty());
    }

    #[tokio::test]
    async fn store_is_usable_after_a_failed_purchase() {
        let (store, service) = service();
        let item_id = stock_item(&service, 3).await;

        assert!(service.buy_item(buy(item_id, 4)).await.is_err());
        service.buy_item(buy(item_id, 3)).await.unwrap();

        assert_eq!(store.item(item_id).await.unwrap().current_stock_value(), 0);
    }

    #[tokio::test]
    async fn purchases_only_touch_their_own_item() {
        let (store, service) = service();
        let a = stock_item(&service, 5).await;
        let b = stock_item(&service, 5).await;

        service.buy_item(buy(a, 5)).await.unwrap();

        assert_eq!(store.item(a).await.unwrap().current_stock_value(), 0);
        assert_eq!(store.item(b).await.unwrap().current_stock_value(), 5);
    }

    #[tokio::test]
    async fn listing_reflects_committed_purchases() {
        let (_store, service) = service();
        let a = stock_item(&service, 5).await;
        stock_item(&service, 7).await;
        service.buy_item(buy(a, 5)).await.unwrap();

        let items = service.list_items(PageRequest::all()).await.unwrap();
        let stock: Vec<(u64, u64)> = items
            .iter()
            .map(|i| (i.current_stock_value(), i.total_stock_value()))
            .collect();
        assert_eq!(stock, vec![(0, 5), (7, 7)]);

        let second = service.list_items(PageRequest::new(2, 1)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].total_stock_value(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_purchases_never_oversell() {
        let (store, service) = service();
        let service = Arc::new(service);
        let item_id = stock_item(&service, 10).await;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.buy_item(buy(item_id, 3)).await })
            })
            .collect();

        let mut succeeded = 0;
        let mut out_of_stock = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(InventoryError::OutOfStock { .. }) => out_of_stock += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(out_of_stock, 17);
        assert_eq!(store.item(item_id).await.unwrap().current_stock_value(), 1);

        let purchases = store.purchases().await;
        assert_eq!(purchases.len(), 3);
        assert_eq!(purchases.iter().map(|p| p.quantity()).sum::<u64>(), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_single_unit_purchases_drain_exactly() {
        let (store, service) = service();
        let service = Arc::new(service);
        let item_id = stock_item(&service, 25).await;

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.buy_item(buy(item_id, 1)).await.is_ok() })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 25);
        assert_eq!(store.item(item_id).await.unwrap().current_stock_value(), 0);
        assert_eq!(store.purchases().await.len(), 25);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: whatever sequence of buys is applied, committed purchases
            /// plus remaining stock always add up to the total.
            #[test]
            fn purchases_and_stock_add_up_to_total(
                total in 1u64..50,
                quantities in proptest::collection::vec(0u64..20, 1..30),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let (store, service) = service();
                    let item_id = stock_item(&service, total).await;

                    let mut expected = total;
                    for q in &quantities {
                        let result = service.buy_item(buy(item_id, *q)).await;
                        match result {
                            Ok(_) => expected -= q,
                            Err(InventoryError::OutOfStock { available, .. }) => {
                                prop_assert!(*q > available);
                            }
                            Err(InventoryError::Validation(_)) => prop_assert_eq!(*q, 0),
                            Err(other) => prop_assert!(false, "unexpected error: {}", other),
                        }
                    }

                    let current = store.item(item_id).await.unwrap().current_stock_value();
                    let bought: u64 = store.purchases().await.iter().map(|p| p.quantity()).sum();
                    prop_assert_eq!(current, expected);
                    prop_assert_eq!(current + bought, total);
                    Ok(())
                })?;
            }
        }
    }
}
