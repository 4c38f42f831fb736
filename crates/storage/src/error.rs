use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write referenced a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement found less stock than requested.
    /// The surrounding transaction has been rolled back.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// Another order already uses this order number.
    #[error("Order number already in use: {0}")]
    DuplicateOrderNumber(String),

    /// A stored row could not be mapped back into a record.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;
