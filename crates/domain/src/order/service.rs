//! Order service: the order-placement workflow and order queries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{Money, OrderId, Page, PageRequest, ProductId};
use storage::{
    NewOrder, OrderDetails, OrderLine, OrderQuery, OrderStatus, Product, StorageError, Store,
};

use super::{OrderTracking, PlaceOrder, generate_order_number, tracking_stages};
use crate::error::DomainError;
use crate::payment::{PaymentGateway, PaymentOutcome, PaymentRequest};

/// How many order numbers are drawn before a collision is reported.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

type NumberSource = Arc<dyn Fn() -> String + Send + Sync>;

/// The recorded order and the payment outcome that decided its status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacement {
    pub order: OrderDetails,
    pub payment: PaymentOutcome,
}

impl OrderPlacement {
    pub fn is_completed(&self) -> bool {
        self.order.order.status == OrderStatus::Completed
    }
}

/// Service for placing and reading orders.
pub struct OrderService<S: Store, P: PaymentGateway> {
    store: S,
    payments: P,
    next_number: NumberSource,
}

impl<S: Store, P: PaymentGateway> OrderService<S, P> {
    /// Creates a new order service over a store and a payment gateway.
    pub fn new(store: S, payments: P) -> Self {
        Self {
            store,
            payments,
            next_number: Arc::new(|| {
                generate_order_number(Utc::now().date_naive(), &mut rand::thread_rng())
            }),
        }
    }

    /// Replaces the order number generator.
    pub fn with_order_numbers(mut self, f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.next_number = Arc::new(f);
        self
    }

    pub fn payments(&self) -> &P {
        &self.payments
    }

    /// Places an order.
    ///
    /// Validates the cart against live stock without writing, charges the
    /// payment gateway once, then records everything in one store
    /// transaction. An approved charge yields a completed order with lines
    /// and decremented stock; a declined one yields a failed order with
    /// neither.
    #[tracing::instrument(skip(self, cmd), fields(customer = %cmd.customer.email, lines = cmd.items.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<OrderPlacement, DomainError> {
        let start = Instant::now();
        cmd.validate()?;

        let mut products: HashMap<ProductId, Product> = HashMap::new();
        let mut requested: HashMap<ProductId, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(cmd.items.len());
        let mut total = Money::zero();

        for item in &cmd.items {
            let product = match products.get(&item.product_id) {
                Some(product) => product.clone(),
                None => {
                    let product = self
                        .store
                        .get_product(item.product_id)
                        .await?
                        .ok_or_else(|| DomainError::product_not_found(item.product_id))?;
                    products.insert(product.id, product.clone());
                    product
                }
            };

            let wanted = requested.entry(product.id).or_default();
            // A quantity sum past i32::MAX can never be covered by stock.
            match wanted.checked_add(item.quantity) {
                Some(sum) if sum <= product.stock => *wanted = sum,
                _ => {
                    tracing::info!(product_id = %product.id, already = *wanted, quantity = item.quantity, available = product.stock, "insufficient stock");
                    return Err(DomainError::InsufficientStock {
                        product_id: product.id,
                        product_name: product.name,
                    });
                }
            }

            total = product
                .price
                .checked_times(item.quantity)
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| DomainError::validation("Order total is too large"))?;
            lines.push(OrderLine {
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let payment = self
            .payments
            .charge(&PaymentRequest {
                method: cmd.payment_method.clone(),
                phone: cmd.payment_phone.clone(),
                amount: total,
            })
            .await;
        let status = if payment.success {
            OrderStatus::Completed
        } else {
            OrderStatus::Failed
        };

        let mut new_order = NewOrder {
            order_number: String::new(),
            customer: cmd.customer,
            total_amount: total,
            status,
            payment_method: cmd.payment_method,
            payment_phone: cmd.payment_phone,
            shipping: cmd.shipping,
            lines,
        };

        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            new_order.order_number = (self.next_number)();

            match self.store.insert_order(new_order.clone()).await {
                Ok(order) => break order,
                Err(StorageError::DuplicateOrderNumber(number))
                    if attempt < MAX_ORDER_NUMBER_ATTEMPTS =>
                {
                    tracing::warn!(order_number = %number, attempt, "order number taken, drawing another");
                }
                Err(StorageError::InsufficientStock { product_id, .. }) => {
                    tracing::warn!(%product_id, transaction_id = ?payment.transaction_id, "stock drained before commit");
                    let product_name = products
                        .get(&product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| product_id.to_string());
                    return Err(DomainError::InsufficientStock {
                        product_id,
                        product_name,
                    });
                }
                Err(StorageError::ProductNotFound(id)) => {
                    return Err(DomainError::product_not_found(id));
                }
                Err(e) => return Err(e.into()),
            }
        };

        metrics::counter!("orders_placed_total", "status" => status.as_str()).increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(
            order_number = %order.order.order_number,
            status = %status,
            total = %total,
            "order placed"
        );

        Ok(OrderPlacement { order, payment })
    }

    /// Loads one order with its user and lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderDetails, DomainError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Order with ID {id} not found")))
    }

    /// Lists orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<OrderDetails>, DomainError> {
        Ok(self.store.list_orders(query, page).await?)
    }

    /// Looks an order up by number and derives its tracking stages.
    #[tracing::instrument(skip(self))]
    pub async fn track_order(&self, order_number: &str) -> Result<OrderTracking, DomainError> {
        let order = self
            .store
            .find_order_by_number(order_number)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Order {order_number} not found")))?;
        let stages = tracking_stages(&order.order);
        Ok(OrderTracking { order, stages })
    }
}
