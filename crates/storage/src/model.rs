//! Records persisted by the store and the inputs used to create them.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub category: String,
    /// Units on hand; never negative.
    pub stock: i32,
    /// Mean of all review ratings for this product (0 when unreviewed).
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub category: String,
    pub stock: i32,
    /// Initial aggregate rating, used when importing an existing catalog.
    pub rating: f64,
    pub reviews_count: i32,
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
}

impl ProductChanges {
    pub(crate) fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Running mean after folding one more rating into `count` existing ones.
pub fn incremental_mean(mean: f64, count: i32, rating: i32) -> f64 {
    (mean * f64::from(count) + f64::from(rating)) / f64::from(count + 1)
}

/// A customer, identified by email.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Contact details used to find-or-create a user by email.
///
/// When a user with the same email already exists, the stored record wins
/// and these fields are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// An order header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_phone: String,
    pub shipping: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One order line: a snapshot of product, quantity and unit price at order time.
///
/// `product_name` and `product_image` are read from the live catalog and are
/// `None` once the product has been deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
}

impl OrderItem {
    pub fn total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// An order together with its owner and lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub user: User,
    pub items: Vec<OrderItem>,
}

/// A line to record with a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// Everything written when an order is placed.
///
/// Lines are only persisted, and stock only decremented, when `status` is
/// [`OrderStatus::Completed`]; any other status records the bare order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer: NewUser,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_phone: String,
    pub shipping: ShippingAddress,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    pub fn fulfils_lines(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

/// A product review with the reviewer's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review to insert, together with its author's contact details.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub reviewer: NewUser,
    pub rating: i32,
    pub comment: Option<String>,
}
