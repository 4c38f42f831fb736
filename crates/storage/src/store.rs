use async_trait::async_trait;
use common::{OrderId, Page, PageRequest, ProductId};

use crate::model::{
    NewOrder, NewProduct, NewReview, OrderDetails, Product, ProductChanges, Review, User,
};
use crate::query::{OrderQuery, ProductQuery};
use crate::Result;

/// Core trait for store implementations.
///
/// Every method is a single unit of work: multi-row writes
/// ([`Store::insert_order`], [`Store::insert_review`]) apply completely or
/// not at all. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Lists products matching the query, one page at a time.
    async fn list_products(&self, query: &ProductQuery, page: PageRequest)
    -> Result<Page<Product>>;

    /// Fetches one product. Returns None if it does not exist.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a product and returns the stored record.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Applies a partial update. Returns None if the product does not exist.
    async fn update_product(&self, id: ProductId, changes: ProductChanges)
    -> Result<Option<Product>>;

    /// Deletes a product and its reviews. Returns false if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Returns the distinct product categories in ascending order.
    async fn list_categories(&self) -> Result<Vec<String>>;

    /// Counts all products.
    async fn count_products(&self) -> Result<u64>;

    /// Looks up a user by exact (case-sensitive) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Records an order in one transaction.
    ///
    /// Finds-or-creates the customer by email and inserts the order row. When
    /// the order is completed it also inserts every line and decrements each
    /// product's stock with a decrement-if-sufficient; a line that cannot be
    /// covered fails with `InsufficientStock` and nothing is written.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails>;

    /// Fetches one order with its user and lines.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetails>>;

    /// Fetches one order by its human-facing order number.
    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<OrderDetails>>;

    /// Lists orders matching the query, newest first.
    async fn list_orders(&self, query: &OrderQuery, page: PageRequest)
    -> Result<Page<OrderDetails>>;

    /// Records a review in one transaction.
    ///
    /// Finds-or-creates the reviewer by email, inserts the review and folds
    /// its rating into the product's running mean and review count.
    async fn insert_review(&self, review: NewReview) -> Result<Review>;

    /// Lists a product's reviews, newest first.
    async fn list_reviews(&self, product_id: ProductId, page: PageRequest) -> Result<Page<Review>>;
}
