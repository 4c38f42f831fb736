//! Order placement, lookup and tracking.

mod commands;
mod number;
mod service;
mod tracking;

pub use commands::{CartLine, PlaceOrder};
pub use number::generate_order_number;
pub use service::{MAX_ORDER_NUMBER_ATTEMPTS, OrderPlacement, OrderService};
pub use tracking::{OrderTracking, TrackingStage, tracking_stages};
