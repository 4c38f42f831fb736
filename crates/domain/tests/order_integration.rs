//! Integration tests for the order-placement workflow.
//!
//! These tests run the full workflow against the in-memory store with
//! scripted payment outcomes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use common::{Money, PageRequest, ProductId};
use domain::{
    CartLine, DomainError, OrderService, PlaceOrder, ScriptedPaymentGateway,
    order::MAX_ORDER_NUMBER_ATTEMPTS,
};
use storage::{
    InMemoryStore, NewProduct, NewUser, OrderQuery, OrderStatus, ShippingAddress, StorageError,
    Store,
};

async fn add_product(store: &InMemoryStore, name: &str, price: i64, stock: i32) -> ProductId {
    store
        .create_product(NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::from_minor(price),
            image: format!("{name}.jpg"),
            category: "Electronics".to_string(),
            stock,
            rating: 0.0,
            reviews_count: 0,
        })
        .await
        .unwrap()
        .id
}

fn place(items: Vec<CartLine>, email: &str) -> PlaceOrder {
    PlaceOrder {
        items,
        customer: NewUser {
            first_name: "Ayesha".to_string(),
            last_name: "Khan".to_string(),
            email: email.to_string(),
            phone: "03001234567".to_string(),
        },
        payment_method: "jazzcash".to_string(),
        payment_phone: "03001234567".to_string(),
        shipping: ShippingAddress {
            address: "12 Mall Road".to_string(),
            city: "Lahore".to_string(),
            postal_code: "54000".to_string(),
            country: "Pakistan".to_string(),
        },
    }
}

fn service(
    store: &InMemoryStore,
    gateway: &ScriptedPaymentGateway,
) -> OrderService<InMemoryStore, ScriptedPaymentGateway> {
    OrderService::new(store.clone(), gateway.clone())
}

/// Order numbers handed out in sequence, for collision tests.
fn numbers(list: &[&str]) -> impl Fn() -> String + Send + Sync + use<> {
    let queue: Arc<Mutex<VecDeque<String>>> =
        Arc::new(Mutex::new(list.iter().map(|s| s.to_string()).collect()));
    move || queue.lock().unwrap().pop_front().unwrap_or_default()
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn approved_payment_completes_order_and_takes_stock() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 10_000, 5).await;

        let placed = service(&store, &gateway)
            .place_order(place(vec![CartLine::new(a, 2)], "ayesha@example.com"))
            .await
            .unwrap();

        assert!(placed.is_completed());
        assert!(placed.payment.success);
        assert_eq!(placed.order.order.total_amount, Money::from_minor(20_000));
        assert_eq!(placed.order.items.len(), 1);
        assert_eq!(placed.order.items[0].total(), Money::from_minor(20_000));
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 3);
        assert_eq!(gateway.charges()[0].amount, Money::from_minor(20_000));
    }

    #[tokio::test]
    async fn declined_payment_records_failed_order_without_lines() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::declining();
        let a = add_product(&store, "A", 10_000, 5).await;

        let placed = service(&store, &gateway)
            .place_order(place(vec![CartLine::new(a, 2)], "ayesha@example.com"))
            .await
            .unwrap();

        assert!(!placed.is_completed());
        assert_eq!(placed.order.order.status, OrderStatus::Failed);
        assert_eq!(placed.order.order.total_amount, Money::from_minor(20_000));
        assert!(placed.order.items.is_empty());
        assert!(placed.payment.transaction_id.is_none());
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.order_item_count().await, 0);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn total_is_sum_of_line_totals() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 899, 10).await;
        let b = add_product(&store, "B", 12_999, 10).await;

        let placed = service(&store, &gateway)
            .place_order(place(
                vec![CartLine::new(a, 3), CartLine::new(b, 1), CartLine::new(a, 2)],
                "ayesha@example.com",
            ))
            .await
            .unwrap();

        let lines: Money = placed.order.items.iter().map(|item| item.total()).sum();
        assert_eq!(lines, placed.order.order.total_amount);
        assert_eq!(lines, Money::from_minor(5 * 899 + 12_999));
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.get_product(b).await.unwrap().unwrap().stock, 9);
    }

    #[tokio::test]
    async fn order_number_has_store_prefix() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 100, 1).await;

        let placed = service(&store, &gateway)
            .place_order(place(vec![CartLine::new(a, 1)], "ayesha@example.com"))
            .await
            .unwrap();

        let number = &placed.order.order.order_number;
        assert!(number.starts_with("LS"));
        assert_eq!(number.len(), 14);
    }
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn quantity_above_stock_writes_nothing() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "Smart Fitness Watch", 10_000, 5).await;

        let err = service(&store, &gateway)
            .place_order(place(vec![CartLine::new(a, 6)], "ayesha@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Insufficient stock for Smart Fitness Watch");
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_item_count().await, 0);
        assert_eq!(store.user_count().await, 0);
        assert_eq!(gateway.charge_count(), 0);
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn total_past_money_range_is_rejected() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "Gold Bar", 100_000_000_000_000_000, 1000).await;

        let err = service(&store, &gateway)
            .place_order(place(vec![CartLine::new(a, 100)], "ayesha@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(&err, DomainError::Validation(msg) if msg == "Order total is too large"));
        assert_eq!(gateway.charge_count(), 0);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 1000);
    }

    #[tokio::test]
    async fn line_totals_overflowing_together_are_rejected() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 5_000_000_000_000_000_000, 10).await;
        let b = add_product(&store, "B", 5_000_000_000_000_000_000, 10).await;

        let err = service(&store, &gateway)
            .place_order(place(
                vec![CartLine::new(a, 1), CartLine::new(b, 1)],
                "ayesha@example.com",
            ))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Order total is too large");
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn repeated_quantities_past_i32_max_are_short_stock() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 1, i32::MAX).await;

        let err = service(&store, &gateway)
            .place_order(place(
                vec![CartLine::new(a, 1_100_000_000), CartLine::new(a, 1_100_000_000)],
                "ayesha@example.com",
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { product_id, .. } if product_id == a));
        assert_eq!(gateway.charge_count(), 0);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_together() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 10_000, 5).await;

        let err = service(&store, &gateway)
            .place_order(place(
                vec![CartLine::new(a, 3), CartLine::new(a, 3)],
                "ayesha@example.com",
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { product_id, .. } if product_id == a));
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();

        let err = service(&store, &gateway)
            .place_order(place(
                vec![CartLine::new(ProductId::new(999), 1)],
                "ayesha@example.com",
            ))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Product with ID 999 not found");
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_command_is_rejected_before_lookup() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();

        let err = service(&store, &gateway)
            .place_order(place(vec![], "ayesha@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn concurrent_orders_cannot_oversell() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 10_000, 5).await;
        let orders = service(&store, &gateway);

        let (first, second) = tokio::join!(
            orders.place_order(place(vec![CartLine::new(a, 3)], "one@example.com")),
            orders.place_order(place(vec![CartLine::new(a, 3)], "two@example.com")),
        );

        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err, DomainError::InsufficientStock { .. }));
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 2);
        assert_eq!(store.order_count().await, 1);
    }
}

mod order_numbers {
    use super::*;

    #[tokio::test]
    async fn collision_draws_a_new_number_without_recharging() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 100, 10).await;

        service(&store, &gateway)
            .with_order_numbers(numbers(&["LS202401010001"]))
            .place_order(place(vec![CartLine::new(a, 1)], "one@example.com"))
            .await
            .unwrap();

        let placed = service(&store, &gateway)
            .with_order_numbers(numbers(&["LS202401010001", "LS202401010002"]))
            .place_order(place(vec![CartLine::new(a, 1)], "two@example.com"))
            .await
            .unwrap();

        assert_eq!(placed.order.order.order_number, "LS202401010002");
        assert_eq!(gateway.charge_count(), 2);
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn persistent_collisions_give_up() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 100, 10).await;
        let taken = "LS202401010001";

        service(&store, &gateway)
            .with_order_numbers(numbers(&[taken]))
            .place_order(place(vec![CartLine::new(a, 1)], "one@example.com"))
            .await
            .unwrap();

        let repeated = vec![taken; MAX_ORDER_NUMBER_ATTEMPTS as usize];
        let err = service(&store, &gateway)
            .with_order_numbers(numbers(&repeated))
            .place_order(place(vec![CartLine::new(a, 1)], "two@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Storage(StorageError::DuplicateOrderNumber(_))
        ));
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.get_product(a).await.unwrap().unwrap().stock, 9);
    }
}

mod customers {
    use super::*;

    #[tokio::test]
    async fn repeat_email_reuses_the_user() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        let a = add_product(&store, "A", 100, 10).await;
        let orders = service(&store, &gateway);

        let first = orders
            .place_order(place(vec![CartLine::new(a, 1)], "ayesha@example.com"))
            .await
            .unwrap();
        let mut second_cmd = place(vec![CartLine::new(a, 1)], "ayesha@example.com");
        second_cmd.customer.first_name = "Someone".to_string();
        let second = orders.place_order(second_cmd).await.unwrap();

        assert_eq!(store.user_count().await, 1);
        assert_eq!(first.order.user.id, second.order.user.id);
        assert_eq!(second.order.user.first_name, "Ayesha");

        let page = orders
            .list_orders(
                &OrderQuery::new().user(first.order.user.id),
                PageRequest::new(1, 10).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
    }
}

mod tracking {
    use super::*;

    #[tokio::test]
    async fn tracking_reflects_payment_outcome() {
        let store = InMemoryStore::new();
        let gateway = ScriptedPaymentGateway::new();
        gateway.push_outcome(true);
        gateway.push_outcome(false);
        let a = add_product(&store, "A", 100, 10).await;
        let orders = service(&store, &gateway);

        let paid = orders
            .place_order(place(vec![CartLine::new(a, 1)], "ayesha@example.com"))
            .await
            .unwrap();
        let declined = orders
            .place_order(place(vec![CartLine::new(a, 1)], "ayesha@example.com"))
            .await
            .unwrap();

        let tracked = orders
            .track_order(&paid.order.order.order_number)
            .await
            .unwrap();
        assert_eq!(tracked.order.order.id, paid.order.order.id);
        let completed: Vec<_> = tracked.stages.iter().map(|s| s.completed).collect();
        assert_eq!(completed, [true, true, false, false, false]);

        let tracked = orders
            .track_order(&declined.order.order.order_number)
            .await
            .unwrap();
        let completed: Vec<_> = tracked.stages.iter().map(|s| s.completed).collect();
        assert_eq!(completed, [true, false, false, false, false]);
    }

    #[tokio::test]
    async fn unknown_order_number_is_not_found() {
        let store = InMemoryStore::new();
        let orders = service(&store, &ScriptedPaymentGateway::new());

        assert!(matches!(
            orders.track_order("LS000000000000").await,
            Err(DomainError::NotFound(_))
        ));
    }
}
