//! Types shared by every LocalStore crate.

pub mod money;
pub mod page;
pub mod types;

pub use money::Money;
pub use page::{MAX_PER_PAGE, Page, PageRequest, PageRequestError, Pagination};
pub use types::{OrderId, OrderItemId, ProductId, ReviewId, UserId};
