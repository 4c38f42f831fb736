//! Review service: review submission and listing.

use common::{Page, PageRequest, ProductId};
use storage::{NewReview, NewUser, Review, StorageError, Store};

use crate::error::{DomainError, limit_text, require_text};

/// Phone recorded for reviewers who did not give one.
pub const DEFAULT_REVIEWER_PHONE: &str = "0300-0000000";

/// Command to review a product.
#[derive(Debug, Clone, PartialEq)]
pub struct AddReview {
    pub product_id: ProductId,
    pub rating: i32,
    pub comment: Option<String>,
    pub user_email: String,
    /// Display name, used only when the email is new to the store.
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
}

impl AddReview {
    fn validate(&self) -> Result<(), DomainError> {
        if !(1..=5).contains(&self.rating) {
            return Err(DomainError::validation("Rating must be between 1 and 5"));
        }
        require_text("User email", &self.user_email, 100)?;
        if let Some(phone) = &self.user_phone {
            limit_text("User phone", phone, 20)?;
        }
        Ok(())
    }

    fn reviewer(&self) -> NewUser {
        let (first_name, last_name) = split_name(self.user_name.as_deref().unwrap_or_default());
        NewUser {
            first_name,
            last_name,
            email: self.user_email.clone(),
            phone: self
                .user_phone
                .clone()
                .filter(|phone| !phone.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REVIEWER_PHONE.to_string()),
        }
    }
}

/// Splits a display name into first name (first word) and last name (the
/// rest), defaulting to "Anonymous" and "User".
fn split_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or("Anonymous").to_string();
    let rest = words.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() {
        "User".to_string()
    } else {
        rest
    };
    (truncate(first, 50), truncate(last, 50))
}

fn truncate(s: String, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

/// Service for product reviews.
#[derive(Clone)]
pub struct ReviewService<S: Store> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a review and folds its rating into the product's running mean.
    #[tracing::instrument(skip(self, cmd), fields(product_id = %cmd.product_id, rating = cmd.rating))]
    pub async fn add_review(&self, cmd: AddReview) -> Result<Review, DomainError> {
        cmd.validate()?;
        if self.store.get_product(cmd.product_id).await?.is_none() {
            return Err(DomainError::product_not_found(cmd.product_id));
        }

        let new_review = NewReview {
            product_id: cmd.product_id,
            reviewer: cmd.reviewer(),
            rating: cmd.rating,
            comment: cmd.comment.filter(|c| !c.trim().is_empty()),
        };

        // The product can vanish between the check and the insert.
        let review = match self.store.insert_review(new_review).await {
            Ok(review) => review,
            Err(StorageError::ProductNotFound(id)) => {
                return Err(DomainError::product_not_found(id));
            }
            Err(e) => return Err(e.into()),
        };

        metrics::counter!("reviews_added_total").increment(1);
        tracing::info!(review_id = %review.id, "review added");
        Ok(review)
    }

    /// Lists a product's reviews, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_reviews(
        &self,
        product_id: ProductId,
        page: PageRequest,
    ) -> Result<Page<Review>, DomainError> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(DomainError::product_not_found(product_id));
        }
        Ok(self.store.list_reviews(product_id, page).await?)
    }
}
