pub mod categories;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod root;

use common::{Money, PageRequest};

use crate::error::ApiError;

/// Builds a page request from optional `page`/`per_page` query values.
pub(crate) fn page_request(
    page: Option<u32>,
    per_page: Option<u32>,
    default_per_page: u32,
) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::new(
        page.unwrap_or(1),
        per_page.unwrap_or(default_per_page),
    )?)
}

/// Converts a decimal amount from a request body into minor units.
pub(crate) fn money(field: &str, major: f64) -> Result<Money, ApiError> {
    Money::try_from_major(major)
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is out of range")))
}
