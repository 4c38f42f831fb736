//! Business rules for the LocalStore backend.
//!
//! This crate provides:
//! - [`OrderService`]: the order-placement workflow, order queries and tracking
//! - [`PaymentGateway`] with a simulated and a scripted implementation
//! - [`ReviewService`]: review submission with running-mean rating updates
//! - [`CatalogService`]: product CRUD, listing and categories

pub mod catalog;
pub mod error;
pub mod order;
pub mod payment;
pub mod review;

pub use catalog::{CatalogService, ProductDraft};
pub use error::DomainError;
pub use order::{
    CartLine, OrderPlacement, OrderService, OrderTracking, PlaceOrder, TrackingStage,
    generate_order_number, tracking_stages,
};
pub use payment::{
    PaymentGateway, PaymentOutcome, PaymentRequest, ScriptedPaymentGateway,
    SimulatedPaymentGateway, simulate_payment,
};
pub use review::{AddReview, DEFAULT_REVIEWER_PHONE, ReviewService};
