//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container. Each test works on its own
//! category and customer emails so they can run concurrently. Run with:
//!
//! ```bash
//! cargo test -p storage --test postgres_integration
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Money, PageRequest, ProductId};
use storage::{
    NewOrder, NewProduct, NewReview, NewUser, OrderLine, OrderQuery, OrderStatus, PostgresStore,
    ProductChanges, ProductQuery, ProductSort, ShippingAddress, StorageError, Store,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

static NEXT_TAG: AtomicUsize = AtomicUsize::new(1);

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a store with its own pool
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

/// Unique suffix so concurrently running tests never see each other's rows.
fn tag() -> usize {
    NEXT_TAG.fetch_add(1, Ordering::SeqCst)
}

fn product(name: &str, category: &str, price: f64, stock: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} for everyday use"),
        price: Money::from_major(price),
        image: "https://images.example/item.jpg".to_string(),
        category: category.to_string(),
        stock,
        rating: 0.0,
        reviews_count: 0,
    }
}

fn customer(email: &str) -> NewUser {
    NewUser {
        first_name: "Bilal".to_string(),
        last_name: "Ahmed".to_string(),
        email: email.to_string(),
        phone: "0301-7654321".to_string(),
    }
}

fn order(
    number: String,
    email: &str,
    status: OrderStatus,
    lines: Vec<OrderLine>,
) -> NewOrder {
    NewOrder {
        order_number: number,
        customer: customer(email),
        total_amount: lines.iter().map(|l| l.unit_price.times(l.quantity)).sum(),
        status,
        payment_method: "easypaisa".to_string(),
        payment_phone: "0301-7654321".to_string(),
        shipping: ShippingAddress {
            address: "House 4, Street 9".to_string(),
            city: "Karachi".to_string(),
            postal_code: "74000".to_string(),
            country: "Pakistan".to_string(),
        },
        lines,
    }
}

fn first_page(per_page: u32) -> PageRequest {
    PageRequest::new(1, per_page).unwrap()
}

#[tokio::test]
async fn create_update_and_delete_product() {
    let store = get_test_store().await;
    let category = format!("crud-{}", tag());

    let created = store
        .create_product(product("Lamp", &category, 2499.0, 7))
        .await
        .unwrap();
    assert_eq!(created.price.minor(), 249_900);
    assert_eq!(created.stock, 7);

    let updated = store
        .update_product(
            created.id,
            ProductChanges {
                price: Some(Money::from_major(1999.0)),
                stock: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Lamp");
    assert_eq!(updated.price.minor(), 199_900);
    assert_eq!(updated.stock, 3);

    assert!(store.delete_product(created.id).await.unwrap());
    assert!(store.get_product(created.id).await.unwrap().is_none());
    assert!(!store.delete_product(created.id).await.unwrap());
    assert!(
        store
            .update_product(created.id, ProductChanges::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn list_products_filters_sorts_and_paginates() {
    let store = get_test_store().await;
    let category = format!("list-{}", tag());

    for (name, price) in [("Kettle", 30.0), ("Blender", 90.0), ("Toaster", 60.0)] {
        store
            .create_product(product(name, &category, price, 1))
            .await
            .unwrap();
    }

    let query = ProductQuery::new()
        .category(category.clone())
        .sort(ProductSort::PriceHigh);
    let page = store.list_products(&query, first_page(2)).await.unwrap();
    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Blender", "Toaster"]);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.pages, 2);

    let query = ProductQuery::new().category(category.clone()).search("Toast");
    let page = store.list_products(&query, first_page(10)).await.unwrap();
    assert_eq!(page.items.len(), 1);

    // Matching follows the default (case-sensitive) collation.
    let query = ProductQuery::new().category(category.clone()).search("toast");
    let page = store.list_products(&query, first_page(10)).await.unwrap();
    assert!(page.items.is_empty());

    let categories = store.list_categories().await.unwrap();
    assert!(categories.contains(&category));
}

#[tokio::test]
async fn completed_order_is_atomic_with_stock_decrement() {
    let store = get_test_store().await;
    let tag = tag();
    let category = format!("order-{tag}");
    let email = format!("buyer-{tag}@example.com");

    let item = store
        .create_product(product("Scarf", &category, 100.0, 5))
        .await
        .unwrap();

    let details = store
        .insert_order(order(
            format!("LSTEST{tag}A"),
            &email,
            OrderStatus::Completed,
            vec![OrderLine {
                product_id: item.id,
                quantity: 2,
                unit_price: item.price,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(details.order.status, OrderStatus::Completed);
    assert_eq!(details.order.total_amount, Money::from_major(200.0));
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.items[0].total(), Money::from_major(200.0));
    assert_eq!(details.items[0].product_name.as_deref(), Some("Scarf"));
    assert_eq!(details.user.email, email);

    let after = store.get_product(item.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 3);

    let by_number = store
        .find_order_by_number(&details.order.order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number.order.id, details.order.id);
}

#[tokio::test]
async fn short_stock_rolls_back_user_and_order() {
    let store = get_test_store().await;
    let tag = tag();
    let email = format!("short-{tag}@example.com");

    let first = store
        .create_product(product("Mug", &format!("short-{tag}"), 10.0, 5))
        .await
        .unwrap();
    let second = store
        .create_product(product("Plate", &format!("short-{tag}"), 10.0, 1))
        .await
        .unwrap();

    let result = store
        .insert_order(order(
            format!("LSTEST{tag}B"),
            &email,
            OrderStatus::Completed,
            vec![
                OrderLine {
                    product_id: first.id,
                    quantity: 2,
                    unit_price: first.price,
                },
                OrderLine {
                    product_id: second.id,
                    quantity: 2,
                    unit_price: second.price,
                },
            ],
        ))
        .await;

    assert!(matches!(
        result,
        Err(StorageError::InsufficientStock { available: 1, .. })
    ));
    // The first line's decrement was rolled back with everything else.
    assert_eq!(store.get_product(first.id).await.unwrap().unwrap().stock, 5);
    assert!(store.find_user_by_email(&email).await.unwrap().is_none());
    assert!(
        store
            .find_order_by_number(&format!("LSTEST{tag}B"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn failed_order_keeps_audit_row_only() {
    let store = get_test_store().await;
    let tag = tag();
    let email = format!("declined-{tag}@example.com");
    let item = store
        .create_product(product("Rug", &format!("failed-{tag}"), 50.0, 4))
        .await
        .unwrap();

    let details = store
        .insert_order(order(
            format!("LSTEST{tag}C"),
            &email,
            OrderStatus::Failed,
            vec![OrderLine {
                product_id: item.id,
                quantity: 1,
                unit_price: item.price,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(details.order.status, OrderStatus::Failed);
    assert!(details.items.is_empty());
    assert_eq!(store.get_product(item.id).await.unwrap().unwrap().stock, 4);

    let failed = store
        .list_orders(
            &OrderQuery::new()
                .status(OrderStatus::Failed)
                .user(details.user.id),
            first_page(10),
        )
        .await
        .unwrap();
    assert_eq!(failed.items.len(), 1);
}

#[tokio::test]
async fn duplicate_order_number_is_reported() {
    let store = get_test_store().await;
    let tag = tag();
    let number = format!("LSTEST{tag}D");
    let email = format!("dup-{tag}@example.com");

    store
        .insert_order(order(number.clone(), &email, OrderStatus::Failed, vec![]))
        .await
        .unwrap();
    let result = store
        .insert_order(order(number, &email, OrderStatus::Failed, vec![]))
        .await;
    assert!(matches!(result, Err(StorageError::DuplicateOrderNumber(_))));
}

#[tokio::test]
async fn repeat_customer_reuses_user_row() {
    let store = get_test_store().await;
    let tag = tag();
    let email = format!("repeat-{tag}@example.com");

    let first = store
        .insert_order(order(format!("LSTEST{tag}E"), &email, OrderStatus::Failed, vec![]))
        .await
        .unwrap();
    let second = store
        .insert_order(order(format!("LSTEST{tag}F"), &email, OrderStatus::Failed, vec![]))
        .await
        .unwrap();
    assert_eq!(first.user.id, second.user.id);

    let orders = store
        .list_orders(&OrderQuery::new().user(first.user.id), first_page(10))
        .await
        .unwrap();
    assert_eq!(orders.pagination.total, 2);
    // Newest first.
    assert_eq!(orders.items[0].order.id, second.order.id);
}

#[tokio::test]
async fn reviews_fold_into_running_mean() {
    let store = get_test_store().await;
    let tag = tag();
    let item = store
        .create_product(product("Chair", &format!("review-{tag}"), 75.0, 2))
        .await
        .unwrap();

    for (n, rating) in [5, 2, 4].into_iter().enumerate() {
        store
            .insert_review(NewReview {
                product_id: item.id,
                reviewer: customer(&format!("reviewer-{tag}-{n}@example.com")),
                rating,
                comment: Some(format!("rated {rating}")),
            })
            .await
            .unwrap();
    }

    let rated = store.get_product(item.id).await.unwrap().unwrap();
    assert_eq!(rated.reviews_count, 3);
    assert!((rated.rating - 11.0 / 3.0).abs() < 1e-9);

    let reviews = store.list_reviews(item.id, first_page(2)).await.unwrap();
    assert_eq!(reviews.items.len(), 2);
    assert_eq!(reviews.pagination.total, 3);
    assert_eq!(reviews.items[0].rating, 4);
    assert_eq!(reviews.items[0].user_name, "Bilal Ahmed");

    assert!(store.delete_product(item.id).await.unwrap());
    let reviews = store.list_reviews(item.id, first_page(10)).await.unwrap();
    assert_eq!(reviews.pagination.total, 0);
}

#[tokio::test]
async fn review_for_missing_product_is_rejected() {
    let store = get_test_store().await;
    let result = store
        .insert_review(NewReview {
            product_id: ProductId::new(i64::MAX),
            reviewer: customer(&format!("nobody-{}@example.com", tag())),
            rating: 3,
            comment: None,
        })
        .await;
    assert!(matches!(result, Err(StorageError::ProductNotFound(_))));
}
