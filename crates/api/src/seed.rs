//! Sample catalog loaded into an empty store at startup.

use common::Money;
use storage::NewProduct;

#[allow(clippy::too_many_arguments)]
fn product(
    name: &str,
    description: &str,
    price: f64,
    photo: &str,
    category: &str,
    stock: i32,
    rating: f64,
    reviews_count: i32,
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: description.to_string(),
        price: Money::from_major(price),
        image: format!("https://images.unsplash.com/{photo}?w=400&h=400&fit=crop"),
        category: category.to_string(),
        stock,
        rating,
        reviews_count,
    }
}

/// The six-product demo catalog.
pub fn sample_products() -> Vec<NewProduct> {
    vec![
        product(
            "Premium Wireless Headphones",
            "High-quality wireless headphones with noise cancellation and premium sound quality.",
            8999.0,
            "photo-1505740420928-5e560c06d30e",
            "Electronics",
            15,
            4.5,
            128,
        ),
        product(
            "Organic Cotton T-Shirt",
            "Soft and comfortable organic cotton t-shirt available in multiple colors.",
            1299.0,
            "photo-1521572163474-6864f9cf17ab",
            "Clothing",
            32,
            4.2,
            85,
        ),
        product(
            "Smart Fitness Watch",
            "Track your fitness goals with this advanced smartwatch featuring heart rate monitoring.",
            12999.0,
            "photo-1523275335684-37898b6baf30",
            "Electronics",
            8,
            4.7,
            203,
        ),
        product(
            "Artisan Coffee Beans",
            "Premium roasted coffee beans sourced from the finest plantations.",
            1599.0,
            "photo-1559056199-641a0ac8b55e",
            "Food",
            24,
            4.8,
            167,
        ),
        product(
            "Minimalist Backpack",
            "Sleek and functional backpack perfect for work, travel, and everyday use.",
            3999.0,
            "photo-1553062407-98eeb64c6a62",
            "Accessories",
            18,
            4.4,
            94,
        ),
        product(
            "Ceramic Plant Pot",
            "Beautiful handcrafted ceramic pot perfect for your indoor plants.",
            899.0,
            "photo-1485955900006-10f4d324d411",
            "Home",
            45,
            4.3,
            76,
        ),
    ]
}
