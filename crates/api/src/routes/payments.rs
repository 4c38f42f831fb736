//! Standalone payment simulation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{PaymentGateway, PaymentRequest};
use serde::Deserialize;
use storage::Store;

use super::money;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::views::PaymentView;

#[derive(Debug, Deserialize)]
pub struct SimulatePaymentRequest {
    pub method: String,
    pub phone_number: String,
    pub amount: f64,
}

/// POST /api/payments/simulate — run one charge without placing an order.
///
/// A declined charge is still a `200`; the outcome is in `success`.
#[tracing::instrument(skip(state, req))]
pub async fn simulate<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiJson(req): ApiJson<SimulatePaymentRequest>,
) -> Result<Json<PaymentView>, ApiError> {
    if req.method.trim().is_empty() {
        return Err(ApiError::BadRequest("Payment method is required".to_string()));
    }

    let amount = money("Amount", req.amount)?;
    let outcome = state
        .orders
        .payments()
        .charge(&PaymentRequest {
            method: req.method,
            phone: req.phone_number,
            amount,
        })
        .await;

    Ok(Json(outcome.into()))
}
