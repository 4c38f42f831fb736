//! Catalog service: product CRUD, listing and categories.

use common::{Money, Page, PageRequest, ProductId};
use storage::{NewProduct, Product, ProductChanges, ProductQuery, Store};

use crate::error::{DomainError, limit_text, require_text};

/// Highest accepted product price: one billion in major units.
pub const MAX_PRICE: Money = Money::from_minor(100_000_000_000);

/// Fields a caller supplies to create a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub category: String,
    pub stock: i32,
}

impl ProductDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("Product name", &self.name, 100)?;
        require_text("Product description", &self.description, 10_000)?;
        require_text("Product image", &self.image, 200)?;
        require_text("Product category", &self.category, 50)?;
        check_price(self.price)?;
        check_stock(self.stock)
    }
}

impl From<ProductDraft> for NewProduct {
    fn from(draft: ProductDraft) -> Self {
        NewProduct {
            name: draft.name,
            description: draft.description,
            price: draft.price,
            image: draft.image,
            category: draft.category,
            stock: draft.stock,
            rating: 0.0,
            reviews_count: 0,
        }
    }
}

fn validate_changes(changes: &ProductChanges) -> Result<(), DomainError> {
    if let Some(name) = &changes.name {
        require_text("Product name", name, 100)?;
    }
    if let Some(description) = &changes.description {
        limit_text("Product description", description, 10_000)?;
    }
    if let Some(image) = &changes.image {
        require_text("Product image", image, 200)?;
    }
    if let Some(category) = &changes.category {
        require_text("Product category", category, 50)?;
    }
    if let Some(price) = changes.price {
        check_price(price)?;
    }
    if let Some(stock) = changes.stock {
        check_stock(stock)?;
    }
    Ok(())
}

fn check_price(price: Money) -> Result<(), DomainError> {
    if price.is_negative() {
        return Err(DomainError::validation("Price must not be negative"));
    }
    if price > MAX_PRICE {
        return Err(DomainError::validation("Price is too large"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::validation("Stock must not be negative"));
    }
    Ok(())
}

/// Service for the product catalog.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>, DomainError> {
        Ok(self.store.list_products(query, page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, DomainError> {
        draft.validate()?;
        let product = self.store.create_product(draft.into()).await?;
        metrics::counter!("products_created_total").increment(1);
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Applies a partial update; absent fields keep their value.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        validate_changes(&changes)?;
        self.store
            .update_product(id, changes)
            .await?
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    /// Deletes a product and its reviews.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::product_not_found(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn categories(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.store.list_categories().await?)
    }

    /// Inserts `products` when the catalog is empty. Returns how many were
    /// inserted.
    #[tracing::instrument(skip(self, products))]
    pub async fn seed_if_empty(&self, products: Vec<NewProduct>) -> Result<usize, DomainError> {
        if self.store.count_products().await? > 0 {
            return Ok(0);
        }
        let count = products.len();
        for product in products {
            self.store.create_product(product).await?;
        }
        tracing::info!(count, "sample catalog seeded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryStore;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Minimalist Backpack".to_string(),
            description: "Sleek everyday backpack".to_string(),
            price: Money::from_minor(399_900),
            image: "backpack.jpg".to_string(),
            category: "Accessories".to_string(),
            stock: 18,
        }
    }

    #[tokio::test]
    async fn create_then_get_starts_unrated() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let created = catalog.create_product(draft()).await.unwrap();
        assert_eq!(created.rating, 0.0);
        assert_eq!(created.reviews_count, 0);

        let fetched = catalog.get_product(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn negative_price_or_stock_is_rejected() {
        let catalog = CatalogService::new(InMemoryStore::new());

        let mut bad = draft();
        bad.price = Money::from_minor(-1);
        assert!(matches!(
            catalog.create_product(bad).await,
            Err(DomainError::Validation(_))
        ));

        let product = catalog.create_product(draft()).await.unwrap();
        let changes = ProductChanges {
            stock: Some(-3),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, changes).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(catalog.get_product(product.id).await.unwrap().stock, 18);
    }

    #[tokio::test]
    async fn price_above_ceiling_is_rejected() {
        let catalog = CatalogService::new(InMemoryStore::new());

        let mut top = draft();
        top.price = MAX_PRICE;
        let product = catalog.create_product(top).await.unwrap();

        let mut bad = draft();
        bad.price = Money::from_minor(MAX_PRICE.minor() + 1);
        let err = catalog.create_product(bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Price is too large");

        let changes = ProductChanges {
            price: Some(Money::from_minor(i64::MAX)),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, changes).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(catalog.get_product(product.id).await.unwrap().price, MAX_PRICE);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let product = catalog.create_product(draft()).await.unwrap();

        let updated = catalog
            .update_product(
                product.id,
                ProductChanges {
                    price: Some(Money::from_minor(349_900)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, Money::from_minor(349_900));
        assert_eq!(updated.name, product.name);
        assert_eq!(updated.stock, product.stock);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let id = ProductId::new(404);

        assert!(matches!(catalog.get_product(id).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            catalog.update_product(id, ProductChanges::default()).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(catalog.delete_product(id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_catalog() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let sample = vec![NewProduct::from(draft())];

        assert_eq!(catalog.seed_if_empty(sample.clone()).await.unwrap(), 1);
        assert_eq!(catalog.seed_if_empty(sample).await.unwrap(), 0);
        assert_eq!(catalog.categories().await.unwrap(), vec!["Accessories"]);
    }
}
