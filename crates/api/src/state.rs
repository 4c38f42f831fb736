//! Shared application state.

use domain::{CatalogService, OrderService, PaymentGateway, ReviewService};
use storage::Store;

/// Shared application state accessible from all handlers.
///
/// Every service holds a handle to the same store.
pub struct AppState<S: Store, P: PaymentGateway> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S, P>,
    pub reviews: ReviewService<S>,
}

impl<S: Store + Clone, P: PaymentGateway> AppState<S, P> {
    pub fn new(store: S, payments: P) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            orders: OrderService::new(store, payments),
        }
    }
}
