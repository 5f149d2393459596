//! Storefront flows as the server drives them, and the JSON they persist.

use std::sync::Arc;

use serde_json::json;
use stockroom_engine::{
    AdminGate, CartStore, InventoryStore, MemoryStore, OrderStatus, Product, Recipient,
    RecordingNotifier, Shop, ShopConfig, Variant,
};

const NOW: u64 = 1_706_745_600_000;

async fn shop() -> (Shop, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let shop = Shop::with_notifier(store.clone(), ShopConfig::default(), notifier.clone());

    shop.catalog()
        .upsert_product(&AdminGate::trusted(NOW), Product::new(
            "pod-1",
            "Pod",
            1500,
            "pods",
            vec![Variant::new("Mint", 2), Variant::new("Menthol", 1)],
        ))
        .await
        .unwrap();

    (shop, store, notifier)
}

#[cfg(test)]
mod shop_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_cart_document_shape() {
        let (shop, store, _) = shop().await;

        shop.reservations()
            .add_line(42, "pod-1", "Mint", 2, NOW)
            .await
            .unwrap();

        let cart = store.load_cart(42).await.unwrap();
        let value = serde_json::to_value(&cart).unwrap();

        assert_eq!(value["customer_id"], 42);
        assert_eq!(value["cart_expires_at"], NOW + 600_000);
        assert_eq!(value["cart"][0]["product_id"], "pod-1");
        assert_eq!(value["cart"][0]["flavor"], "Mint");
        assert_eq!(value["cart"][0]["quantity"], 2);
        assert_eq!(value["cart"][0]["price"], 1500);
    }

    #[tokio::test]
    async fn test_checkout_notifies_operators() {
        let (shop, _, notifier) = shop().await;

        shop.reservations()
            .add_line(42, "pod-1", "Menthol", 1, NOW)
            .await
            .unwrap();
        let order = shop.orders().checkout(42, NOW + 1_000).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total(), 1500);
        assert_eq!(notifier.notices_for(Recipient::Operators).len(), 1);

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["user_id"], 42);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["created_at"], NOW + 1_000);
    }

    #[tokio::test]
    async fn test_confirm_then_cancel_is_refused() {
        let (shop, store, notifier) = shop().await;
        let grant = AdminGate::trusted(NOW);

        shop.reservations()
            .add_line(42, "pod-1", "Mint", 1, NOW)
            .await
            .unwrap();
        let order = shop.orders().checkout(42, NOW).await.unwrap();

        let confirmed = shop.orders().confirm(&grant, &order.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(!notifier.notices_for(Recipient::Customer(42)).is_empty());

        assert!(shop.orders().cancel(&grant, &order.id).await.is_err());
        assert_eq!(store.variant_stock("pod-1", "Mint").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_catalog_edit_keeps_reserved_stock() {
        let (shop, store, _) = shop().await;

        shop.reservations()
            .add_line(42, "pod-1", "Mint", 2, NOW)
            .await
            .unwrap();

        // Renaming the product must not refill the variant
        shop.catalog()
            .upsert_product(&AdminGate::trusted(NOW), Product::new(
                "pod-1",
                "Pod Max",
                1700,
                "pods",
                vec![Variant::new("Mint", 2), Variant::new("Menthol", 1)],
            ))
            .await
            .unwrap();

        assert_eq!(store.variant_stock("pod-1", "Mint").await.unwrap(), Some(0));
        let product = shop.catalog().product("pod-1").await.unwrap();
        assert_eq!(product.name, "Pod Max");
    }

    #[test]
    fn test_product_json_shape() {
        let product = Product::new("pod-1", "Pod", 1500, "pods", vec![Variant::new("Mint", 2)]);
        let value = serde_json::to_value(&product).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "pod-1",
                "name": "Pod",
                "price": 1500,
                "category": "pods",
                "flavors": [{"name": "Mint", "quantity": 2}]
            })
        );
    }
}
