use common::UserId;

use crate::model::OrderStatus;

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Name ascending.
    #[default]
    Name,
    /// Price ascending.
    PriceLow,
    /// Price descending.
    PriceHigh,
    /// Rating descending.
    Rating,
}

impl ProductSort {
    /// Parses the `sort` query parameter. Unknown values fall back to [`ProductSort::Name`].
    pub fn from_param(value: &str) -> Self {
        match value {
            "price-low" => ProductSort::PriceLow,
            "price-high" => ProductSort::PriceHigh,
            "rating" => ProductSort::Rating,
            _ => ProductSort::Name,
        }
    }

    pub(crate) fn order_by_sql(&self) -> &'static str {
        match self {
            ProductSort::Name => "name ASC, id ASC",
            ProductSort::PriceLow => "price ASC, id ASC",
            ProductSort::PriceHigh => "price DESC, id ASC",
            ProductSort::Rating => "rating DESC, id ASC",
        }
    }
}

/// Filters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Exact category match.
    pub category: Option<String>,

    /// Substring matched against name or description.
    pub search: Option<String>,

    pub sort: ProductSort,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }
}

/// Filters for order listings. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub user_id: Option<UserId>,
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
