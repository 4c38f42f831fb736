//! API information document.

use axum::Json;
use serde_json::{Value, json};

/// GET / — describes the API.
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Welcome to the LocalStore E-Commerce API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "products": "/api/products",
            "orders": "/api/orders",
            "categories": "/api/categories",
            "health_check": "/api/health",
            "metrics": "/metrics",
        }
    }))
}
