use std::collections::HashMap;

use async_trait::async_trait;
use common::{Money, OrderId, OrderItemId, Page, PageRequest, ProductId, ReviewId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetails, OrderItem, OrderQuery, Product,
    ProductChanges, ProductQuery, Result, Review, ShippingAddress, StorageError, Store, User,
};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, category, stock, rating, reviews_count, created_at";

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, created_at";

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.user_id, o.total_amount, o.status, o.payment_method,
           o.payment_phone, o.shipping_address, o.shipping_city, o.shipping_postal_code,
           o.shipping_country, o.created_at, o.updated_at,
           u.first_name, u.last_name, u.email, u.phone, u.created_at AS user_created_at
    FROM orders o
    JOIN users u ON u.id = o.user_id
"#;

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, r.created_at,
           u.first_name, u.last_name
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_minor(row.try_get("price")?),
            image: row.try_get("image")?,
            category: row.try_get("category")?,
            stock: row.try_get("stock")?,
            rating: row.try_get("rating")?,
            reviews_count: row.try_get("reviews_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<(Order, User)> {
        let status: String = row.try_get("status")?;
        let user_id = UserId::new(row.try_get("user_id")?);

        let order = Order {
            id: OrderId::new(row.try_get("id")?),
            order_number: row.try_get("order_number")?,
            user_id,
            total_amount: Money::from_minor(row.try_get("total_amount")?),
            status: status.parse().map_err(StorageError::InvalidRow)?,
            payment_method: row.try_get("payment_method")?,
            payment_phone: row.try_get("payment_phone")?,
            shipping: ShippingAddress {
                address: row.try_get("shipping_address")?,
                city: row.try_get("shipping_city")?,
                postal_code: row.try_get("shipping_postal_code")?,
                country: row.try_get("shipping_country")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };
        let user = User {
            id: user_id,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: row.try_get("user_created_at")?,
        };
        Ok((order, user))
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: OrderItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            price: Money::from_minor(row.try_get("price")?),
            product_name: row.try_get("product_name")?,
            product_image: row.try_get("product_image")?,
        })
    }

    fn row_to_review(row: &PgRow) -> Result<Review> {
        let first_name: String = row.try_get("first_name")?;
        let last_name: String = row.try_get("last_name")?;
        Ok(Review {
            id: ReviewId::new(row.try_get("id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            user_name: format!("{first_name} {last_name}"),
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Finds-or-creates a user by email in a single statement.
    async fn upsert_user(tx: &mut Transaction<'_, Postgres>, user: &NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.phone)
            .fetch_one(&mut **tx)
            .await?;
        Self::row_to_user(&row)
    }

    /// Loads the lines of the given orders in one query.
    async fn attach_items(&self, orders: Vec<(Order, User)>) -> Result<Vec<OrderDetails>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = orders.iter().map(|(o, _)| o.id.as_i64()).collect();
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.order_id, i.product_id, i.quantity, i.price,
                   p.name AS product_name, p.image AS product_image
            FROM order_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = Self::row_to_item(&row)?;
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|(order, user)| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderDetails { order, user, items }
            })
            .collect())
    }

    async fn fetch_one_order(
        &self,
        condition: &str,
        key: OrderKey<'_>,
    ) -> Result<Option<OrderDetails>> {
        let sql = format!("{ORDER_SELECT} WHERE {condition}");
        let query = sqlx::query(&sql);
        let query = match key {
            OrderKey::Id(id) => query.bind(id.as_i64()),
            OrderKey::Number(number) => query.bind(number),
        };
        let Some(row) = query.fetch_optional(&self.pool).await? else {
            return Ok(None);
        };
        let order = Self::row_to_order(&row)?;
        Ok(self.attach_items(vec![order]).await?.pop())
    }
}

/// Lookup key for a single order.
enum OrderKey<'a> {
    Id(OrderId),
    Number(&'a str),
}

#[async_trait]
impl Store for PostgresStore {
    async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        // Build dynamic query
        if query.category.is_some() {
            param_count += 1;
            conditions.push(format!("category = ${param_count}"));
        }
        if query.search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(strpos(name, ${param_count}) > 0 OR strpos(description, ${param_count}) > 0)"
            ));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM products{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref category) = query.category {
            count_query = count_query.bind(category);
        }
        if let Some(ref search) = query.search {
            count_query = count_query.bind(search);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{where_clause} ORDER BY {} LIMIT ${} OFFSET ${}",
            query.sort.order_by_sql(),
            param_count + 1,
            param_count + 2
        );
        let mut page_query = sqlx::query(&page_sql);
        if let Some(ref category) = query.category {
            page_query = page_query.bind(category);
        }
        if let Some(ref search) = query.search {
            page_query = page_query.bind(search);
        }
        let rows = page_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(products, page, total as u64))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let sql = format!(
            r#"
            INSERT INTO products (name, description, price, image, category, stock, rating, reviews_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.minor())
            .bind(&product.image)
            .bind(&product.category)
            .bind(product.stock)
            .bind(product.rating)
            .bind(product.reviews_count)
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_product(&row)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let sql = format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                image = COALESCE($5, image),
                category = COALESCE($6, category),
                stock = COALESCE($7, stock)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.price.map(|p| p.minor()))
            .bind(changes.image)
            .bind(changes.category)
            .bind(changes.stock)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn count_products(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let user = Self::upsert_user(&mut tx, &order.customer).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (order_number, user_id, total_amount, status, payment_method,
                                payment_phone, shipping_address, shipping_city,
                                shipping_postal_code, shipping_country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&order.order_number)
        .bind(user.id.as_i64())
        .bind(order.total_amount.minor())
        .bind(order.status.as_str())
        .bind(&order.payment_method)
        .bind(&order.payment_phone)
        .bind(&order.shipping.address)
        .bind(&order.shipping.city)
        .bind(&order.shipping.postal_code)
        .bind(&order.shipping.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                return StorageError::DuplicateOrderNumber(order.order_number.clone());
            }
            StorageError::Database(e)
        })?;
        let order_id: i64 = row.try_get("id")?;

        if order.fulfils_lines() {
            for line in &order.lines {
                let updated = sqlx::query(
                    "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
                )
                .bind(line.product_id.as_i64())
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    let available: Option<i32> =
                        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                            .bind(line.product_id.as_i64())
                            .fetch_optional(&mut *tx)
                            .await?;
                    tracing::debug!(
                        order_number = %order.order_number,
                        product_id = %line.product_id,
                        "stock decrement failed, rolling back order"
                    );
                    return Err(match available {
                        None => StorageError::ProductNotFound(line.product_id),
                        Some(available) => StorageError::InsufficientStock {
                            product_id: line.product_id,
                            requested: line.quantity,
                            available,
                        },
                    });
                }

                sqlx::query(
                    "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)",
                )
                .bind(order_id)
                .bind(line.product_id.as_i64())
                .bind(line.quantity)
                .bind(line.unit_price.minor())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_order(OrderId::new(order_id))
            .await?
            .ok_or_else(|| StorageError::InvalidRow(format!("order {order_id} missing after commit")))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        self.fetch_one_order("o.id = $1", OrderKey::Id(id)).await
    }

    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<OrderDetails>> {
        self.fetch_one_order("o.order_number = $1", OrderKey::Number(order_number))
            .await
    }

    async fn list_orders(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<OrderDetails>> {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("o.status = ${param_count}"));
        }
        if query.user_id.is_some() {
            param_count += 1;
            conditions.push(format!("o.user_id = ${param_count}"));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM orders o{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(status) = query.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(user_id) = query.user_id {
            count_query = count_query.bind(user_id.as_i64());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "{ORDER_SELECT}{where_clause} ORDER BY o.created_at DESC, o.id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let mut page_query = sqlx::query(&page_sql);
        if let Some(status) = query.status {
            page_query = page_query.bind(status.as_str());
        }
        if let Some(user_id) = query.user_id {
            page_query = page_query.bind(user_id.as_i64());
        }
        let rows = page_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let details = self.attach_items(orders).await?;
        Ok(Page::new(details, page, total as u64))
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let mut tx = self.pool.begin().await?;

        // Lock the product row so concurrent reviews fold in one at a time.
        let product: Option<i64> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(review.product_id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;
        if product.is_none() {
            return Err(StorageError::ProductNotFound(review.product_id));
        }

        let user = Self::upsert_user(&mut tx, &review.reviewer).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(review.product_id.as_i64())
        .bind(user.id.as_i64())
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE products
            SET rating = (rating * reviews_count + $2) / (reviews_count + 1),
                reviews_count = reviews_count + 1
            WHERE id = $1
            "#,
        )
        .bind(review.product_id.as_i64())
        .bind(f64::from(review.rating))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Review {
            id: ReviewId::new(row.try_get("id")?),
            product_id: review.product_id,
            user_id: user.id,
            user_name: user.full_name(),
            rating: review.rating,
            comment: review.comment,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn list_reviews(&self, product_id: ProductId, page: PageRequest) -> Result<Page<Review>> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
                .bind(product_id.as_i64())
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(product_id.as_i64())
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let reviews = rows
            .iter()
            .map(Self::row_to_review)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(reviews, page, total as u64))
    }
}
