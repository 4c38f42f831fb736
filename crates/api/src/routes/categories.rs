use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::PaymentGateway;
use serde::Serialize;
use storage::Store;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<String>,
}

/// GET /api/categories — distinct categories, sorted.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, P: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state.catalog.categories().await?;
    Ok(Json(CategoriesResponse {
        success: true,
        categories,
    }))
}
