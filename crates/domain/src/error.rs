//! Domain error types.

use common::ProductId;
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// A declined payment is not an error: it is reported through
/// [`PaymentOutcome`](crate::payment::PaymentOutcome).
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request failed an input rule.
    #[error("{0}")]
    Validation(String),

    /// A cart line asks for more units than are on hand.
    #[error("Insufficient stock for {product_name}")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
    },

    /// An error occurred in the store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    pub fn product_not_found(id: ProductId) -> Self {
        DomainError::NotFound(format!("Product with ID {id} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

/// Checks that a text field is present and fits its column.
pub(crate) fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    limit_text(field, value, max_len)
}

pub(crate) fn limit_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}
