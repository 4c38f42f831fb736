//! Order tracking stages.
//!
//! Only the first two stages reflect stored state; fulfilment is not
//! modelled, so the remaining stages are always pending.

use chrono::{DateTime, Utc};
use storage::{Order, OrderDetails, OrderStatus};

/// One step of an order's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingStage {
    pub name: &'static str,
    pub completed: bool,
    pub date: Option<DateTime<Utc>>,
}

impl TrackingStage {
    fn done(name: &'static str, date: DateTime<Utc>) -> Self {
        Self {
            name,
            completed: true,
            date: Some(date),
        }
    }

    fn pending(name: &'static str) -> Self {
        Self {
            name,
            completed: false,
            date: None,
        }
    }
}

/// An order together with its tracking stages.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTracking {
    pub order: OrderDetails,
    pub stages: Vec<TrackingStage>,
}

/// Computes the five tracking stages of an order.
pub fn tracking_stages(order: &Order) -> Vec<TrackingStage> {
    let payment = if order.status == OrderStatus::Completed {
        TrackingStage::done("Payment Confirmed", order.created_at)
    } else {
        TrackingStage::pending("Payment Confirmed")
    };

    vec![
        TrackingStage::done("Order Placed", order.created_at),
        payment,
        TrackingStage::pending("Processing"),
        TrackingStage::pending("Shipped"),
        TrackingStage::pending("Delivered"),
    ]
}
