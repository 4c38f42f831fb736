//! Product review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{Pagination, ProductId};
use domain::{AddReview, PaymentGateway};
use serde::{Deserialize, Serialize};
use storage::Store;

use super::page_request;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use crate::views::ReviewView;

const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct ListReviewsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    pub user_email: String,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewListResponse {
    pub success: bool,
    pub reviews: Vec<ReviewView>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct ReviewAddedResponse {
    pub success: bool,
    pub message: &'static str,
    pub review: ReviewView,
}

/// GET /api/products/{id}/reviews — newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(params): ApiQuery<ListReviewsParams>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let page = page_request(params.page, params.per_page, DEFAULT_PER_PAGE)?;
    let result = state.reviews.list_reviews(product_id, page).await?;
    Ok(Json(ReviewListResponse {
        success: true,
        reviews: result.items.into_iter().map(ReviewView::from).collect(),
        pagination: result.pagination,
    }))
}

/// POST /api/products/{id}/reviews
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<AddReviewRequest>,
) -> Result<(StatusCode, Json<ReviewAddedResponse>), ApiError> {
    let review = state
        .reviews
        .add_review(AddReview {
            product_id,
            rating: req.rating,
            comment: req.comment,
            user_email: req.user_email,
            user_name: req.user_name,
            user_phone: req.user_phone,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewAddedResponse {
            success: true,
            message: "Review added successfully",
            review: review.into(),
        }),
    ))
}
