//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{Pagination, ProductId};
use domain::{PaymentGateway, ProductDraft};
use serde::{Deserialize, Serialize};
use storage::{ProductChanges, ProductQuery, ProductSort, Store};

use super::{money, page_request};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use crate::views::ProductView;

const DEFAULT_PER_PAGE: u32 = 20;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    pub stock: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: ProductView,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// -- Handlers --

/// GET /api/products — filter, search, sort and paginate the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiQuery(params): ApiQuery<ListProductsParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let page = page_request(params.page, params.per_page, DEFAULT_PER_PAGE)?;
    let mut query = ProductQuery::new().sort(
        params
            .sort
            .as_deref()
            .map(ProductSort::from_param)
            .unwrap_or_default(),
    );
    if let Some(category) = non_empty(params.category) {
        query = query.category(category);
    }
    if let Some(search) = non_empty(params.search) {
        query = query.search(search);
    }

    let result = state.catalog.list_products(&query, page).await?;
    Ok(Json(ProductListResponse {
        success: true,
        products: result.items.into_iter().map(ProductView::from).collect(),
        pagination: result.pagination,
    }))
}

/// GET /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(id).await?;
    Ok(Json(ProductResponse {
        success: true,
        message: None,
        product: product.into(),
    }))
}

/// POST /api/products — create a product.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let price = money("Price", req.price)?;
    let product = state
        .catalog
        .create_product(ProductDraft {
            name: req.name,
            description: req.description,
            price,
            image: req.image,
            category: req.category,
            stock: req.stock,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: Some("Product created successfully"),
            product: product.into(),
        }),
    ))
}

/// PUT /api/products/{id} — partial update.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let price = req.price.map(|price| money("Price", price)).transpose()?;
    let changes = ProductChanges {
        name: req.name,
        description: req.description,
        price,
        image: req.image,
        category: req.category,
        stock: req.stock,
    };
    let product = state.catalog.update_product(id, changes).await?;

    Ok(Json(ProductResponse {
        success: true,
        message: Some("Product updated successfully"),
        product: product.into(),
    }))
}

/// DELETE /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Product deleted successfully",
    }))
}
