//! JSON representations of store records.
//!
//! Money is rendered in decimal major units.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, ProductId, ReviewId, UserId};
use domain::{PaymentOutcome, TrackingStage};
use serde::Serialize;
use storage::{OrderDetails, OrderItem, OrderStatus, Product, Review, User};

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    pub stock: i32,
    /// Mean rating rounded to one decimal.
    pub rating: f64,
    /// Number of reviews.
    pub reviews: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.as_major(),
            image: p.image,
            category: p.category,
            stock: p.stock,
            rating: (p.rating * 10.0).round() / 10.0,
            reviews: p.reviews_count,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            phone: u.phone,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: f64,
    pub total: f64,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        let total = item.total().as_major();
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_image: item.product_image,
            quantity: item.quantity,
            price: item.price.as_major(),
            total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
    pub user: UserView,
}

impl From<OrderDetails> for OrderView {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, user, items } = details;
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            total_amount: order.total_amount.as_major(),
            status: order.status,
            payment_method: order.payment_method,
            payment_phone: order.payment_phone,
            shipping_address: order.shipping.address,
            shipping_city: order.shipping.city,
            shipping_postal_code: order.shipping.postal_code,
            shipping_country: order.shipping.country,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewView {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            user_name: r.user_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: String,
}

impl From<PaymentOutcome> for PaymentView {
    fn from(p: PaymentOutcome) -> Self {
        Self {
            success: p.success,
            transaction_id: p.transaction_id,
            message: p.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrackingStageView {
    pub name: &'static str,
    pub completed: bool,
    pub date: Option<DateTime<Utc>>,
}

impl From<TrackingStage> for TrackingStageView {
    fn from(s: TrackingStage) -> Self {
        Self {
            name: s.name,
            completed: s.completed,
            date: s.date,
        }
    }
}
