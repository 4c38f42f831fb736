//! Order placement, lookup and tracking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{OrderId, Pagination, ProductId, UserId};
use domain::{CartLine, PaymentGateway, PlaceOrder};
use serde::{Deserialize, Serialize};
use storage::{NewUser, OrderQuery, OrderStatus, ShippingAddress, Store};

use super::page_request;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use crate::views::{OrderView, PaymentView, TrackingStageView};

const DEFAULT_PER_PAGE: u32 = 10;
const DEFAULT_COUNTRY: &str = "Pakistan";

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer: CustomerRequest,
    pub items: Vec<CartItemRequest>,
    pub payment: PaymentRequestBody,
    pub shipping: ShippingRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    /// Product id.
    pub id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestBody {
    pub method: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: Option<String>,
}

impl From<PlaceOrderRequest> for PlaceOrder {
    fn from(req: PlaceOrderRequest) -> Self {
        PlaceOrder {
            items: req
                .items
                .into_iter()
                .map(|item| CartLine::new(item.id, item.quantity))
                .collect(),
            customer: NewUser {
                first_name: req.customer.first_name,
                last_name: req.customer.last_name,
                email: req.customer.email,
                phone: req.customer.phone,
            },
            payment_method: req.payment.method,
            payment_phone: req.payment.phone_number,
            shipping: ShippingAddress {
                address: req.shipping.address,
                city: req.shipping.city,
                postal_code: req.shipping.postal_code,
                country: req
                    .shipping
                    .country
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub user_id: Option<UserId>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub success: bool,
    pub message: String,
    pub order: OrderView,
    pub payment: PaymentView,
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: OrderView,
}

#[derive(Serialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub order: OrderView,
    pub tracking_stages: Vec<TrackingStageView>,
}

// -- Handlers --

/// POST /api/orders — place an order.
///
/// Responds `201` when the payment is approved and `400` with the recorded
/// failed order when it is declined.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let placement = state.orders.place_order(req.into()).await?;

    let (status, message) = if placement.is_completed() {
        (StatusCode::CREATED, "Order placed successfully".to_string())
    } else {
        (StatusCode::BAD_REQUEST, placement.payment.message.clone())
    };

    Ok((
        status,
        Json(OrderPlacedResponse {
            success: placement.is_completed(),
            message,
            order: placement.order.into(),
            payment: placement.payment.into(),
        }),
    ))
}

/// GET /api/orders — list orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiQuery(params): ApiQuery<ListOrdersParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let page = page_request(params.page, params.per_page, DEFAULT_PER_PAGE)?;
    let mut query = OrderQuery::new();
    if let Some(status) = params.status.filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse().map_err(ApiError::BadRequest)?;
        query = query.status(status);
    }
    if let Some(user_id) = params.user_id {
        query = query.user(user_id);
    }

    let result = state.orders.list_orders(&query, page).await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders: result.items.into_iter().map(OrderView::from).collect(),
        pagination: result.pagination,
    }))
}

/// GET /api/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(OrderResponse {
        success: true,
        order: order.into(),
    }))
}

/// GET /api/orders/{order_number}/track
///
/// The path segment shares its name with the id route; here it holds an
/// order number.
#[tracing::instrument(skip(state))]
pub async fn track<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(order_number): ApiPath<String>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let tracking = state.orders.track_order(&order_number).await?;
    Ok(Json(TrackingResponse {
        success: true,
        order: tracking.order.into(),
        tracking_stages: tracking
            .stages
            .into_iter()
            .map(TrackingStageView::from)
            .collect(),
    }))
}
