use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, Page, PageRequest, ProductId, ReviewId, UserId};
use tokio::sync::RwLock;

use crate::model::{
    NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetails, OrderItem, Product,
    ProductChanges, Review, User, incremental_mean,
};
use crate::query::{OrderQuery, ProductQuery, ProductSort};
use crate::{Result, StorageError, Store};

#[derive(Debug, Clone)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Money,
}

#[derive(Debug, Clone)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    order_items: Vec<OrderItemRow>,
    reviews: Vec<ReviewRow>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }

    fn upsert_user(&mut self, new_user: NewUser) -> User {
        if let Some(existing) = self.users.values().find(|u| u.email == new_user.email) {
            return existing.clone();
        }
        let id = UserId::new(self.next_id("users"));
        let user = User {
            id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            phone: new_user.phone,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    fn order_details(&self, order: &Order) -> Result<OrderDetails> {
        let user = self.users.get(&order.user_id).cloned().ok_or_else(|| {
            StorageError::InvalidRow(format!("order {} references missing user", order.id))
        })?;
        let items = self
            .order_items
            .iter()
            .filter(|row| row.order_id == order.id)
            .map(|row| {
                let product = self.products.get(&row.product_id);
                OrderItem {
                    id: row.id,
                    order_id: row.order_id,
                    product_id: row.product_id,
                    quantity: row.quantity,
                    price: row.price,
                    product_name: product.map(|p| p.name.clone()),
                    product_image: product.map(|p| p.image.clone()),
                }
            })
            .collect();
        Ok(OrderDetails {
            order: order.clone(),
            user,
            items,
        })
    }

    fn review(&self, row: &ReviewRow) -> Review {
        let user_name = self
            .users
            .get(&row.user_id)
            .map(User::full_name)
            .unwrap_or_else(|| "Anonymous".to_string());
        Review {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            user_name,
            rating: row.rating,
            comment: row.comment.clone(),
            created_at: row.created_at,
        }
    }
}

/// In-memory store implementation for testing and database-less runs.
///
/// A single write lock around all tables makes every write method atomic:
/// checks run before any mutation inside the same critical section.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Returns the number of stored orders, whatever their status.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored order lines.
    pub async fn order_item_count(&self) -> usize {
        self.tables.read().await.order_items.len()
    }
}

fn compare_products(sort: ProductSort, a: &Product, b: &Product) -> std::cmp::Ordering {
    let primary = match sort {
        ProductSort::Name => a.name.cmp(&b.name),
        ProductSort::PriceLow => a.price.cmp(&b.price),
        ProductSort::PriceHigh => b.price.cmp(&a.price),
        ProductSort::Rating => b.rating.total_cmp(&a.rating),
    };
    primary.then(a.id.cmp(&b.id))
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| {
                if let Some(ref category) = query.category
                    && &p.category != category
                {
                    return false;
                }
                if let Some(ref search) = query.search
                    && !p.name.contains(search.as_str())
                    && !p.description.contains(search.as_str())
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| compare_products(query.sort, a, b));
        Ok(page.slice(products))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;
        let id = ProductId::new(tables.next_id("products"));
        let record = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
            stock: product.stock,
            rating: product.rating,
            reviews_count: product.reviews_count,
            created_at: Utc::now(),
        };
        tables.products.insert(id, record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            changes.apply(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.reviews.retain(|r| r.product_id != id);
        Ok(true)
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let categories: BTreeSet<String> = tables
            .products
            .values()
            .map(|p| p.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.tables.read().await.products.len() as u64)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails> {
        let fulfils_lines = order.fulfils_lines();
        let NewOrder {
            order_number,
            customer,
            total_amount,
            status,
            payment_method,
            payment_phone,
            shipping,
            lines,
        } = order;

        let mut tables = self.tables.write().await;

        if tables
            .orders
            .values()
            .any(|o| o.order_number == order_number)
        {
            return Err(StorageError::DuplicateOrderNumber(order_number));
        }

        // Check every decrement before touching anything.
        if fulfils_lines {
            // Summed in i64 so repeated lines cannot overflow.
            let mut requested: BTreeMap<ProductId, i64> = BTreeMap::new();
            for line in &lines {
                *requested.entry(line.product_id).or_default() += i64::from(line.quantity);
            }
            for (product_id, requested) in requested {
                let product = tables
                    .products
                    .get(&product_id)
                    .ok_or(StorageError::ProductNotFound(product_id))?;
                if i64::from(product.stock) < requested {
                    return Err(StorageError::InsufficientStock {
                        product_id,
                        requested: i32::try_from(requested).unwrap_or(i32::MAX),
                        available: product.stock,
                    });
                }
            }
        }

        let user = tables.upsert_user(customer);
        let now = Utc::now();
        let id = OrderId::new(tables.next_id("orders"));
        let record = Order {
            id,
            order_number,
            user_id: user.id,
            total_amount,
            status,
            payment_method,
            payment_phone,
            shipping,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(id, record.clone());

        if fulfils_lines {
            for line in lines {
                let item_id = OrderItemId::new(tables.next_id("order_items"));
                tables.order_items.push(OrderItemRow {
                    id: item_id,
                    order_id: id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.unit_price,
                });
                if let Some(product) = tables.products.get_mut(&line.product_id) {
                    product.stock -= line.quantity;
                }
            }
        }

        tables.order_details(&record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        let tables = self.tables.read().await;
        tables
            .orders
            .get(&id)
            .map(|order| tables.order_details(order))
            .transpose()
    }

    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<OrderDetails>> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .find(|o| o.order_number == order_number)
            .map(|order| tables.order_details(order))
            .transpose()
    }

    async fn list_orders(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<OrderDetails>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<&Order> = tables
            .orders
            .values()
            .filter(|o| query.status.is_none_or(|status| o.status == status))
            .filter(|o| query.user_id.is_none_or(|user_id| o.user_id == user_id))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = page.slice(orders);
        let items = page
            .items
            .into_iter()
            .map(|order| tables.order_details(order))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page {
            items,
            pagination: page.pagination,
        })
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&review.product_id) {
            return Err(StorageError::ProductNotFound(review.product_id));
        }

        let user = tables.upsert_user(review.reviewer);
        let row = ReviewRow {
            id: ReviewId::new(tables.next_id("reviews")),
            product_id: review.product_id,
            user_id: user.id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        tables.reviews.push(row.clone());

        if let Some(product) = tables.products.get_mut(&row.product_id) {
            product.rating = incremental_mean(product.rating, product.reviews_count, row.rating);
            product.reviews_count += 1;
        }

        Ok(tables.review(&row))
    }

    async fn list_reviews(&self, product_id: ProductId, page: PageRequest) -> Result<Page<Review>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&ReviewRow> = tables
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.slice(rows).map(|row| tables.review(row)))
    }
}
