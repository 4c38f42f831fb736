//! Order commands.

use common::ProductId;
use storage::{NewUser, ShippingAddress};

use crate::error::{DomainError, require_text};

/// One cart line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl CartLine {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place an order for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    pub items: Vec<CartLine>,
    pub customer: NewUser,
    pub payment_method: String,
    pub payment_phone: String,
    pub shipping: ShippingAddress,
}

impl PlaceOrder {
    /// Checks the command's shape. Stock and product existence are checked
    /// against the store by [`OrderService`](super::OrderService).
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::validation("Order must contain at least one item"));
        }
        if let Some(line) = self.items.iter().find(|line| line.quantity <= 0) {
            return Err(DomainError::validation(format!(
                "Quantity for product {} must be greater than 0",
                line.product_id
            )));
        }

        require_text("Customer email", &self.customer.email, 100)?;
        require_text("Customer first name", &self.customer.first_name, 50)?;
        require_text("Customer last name", &self.customer.last_name, 50)?;
        require_text("Customer phone", &self.customer.phone, 20)?;
        require_text("Payment method", &self.payment_method, 20)?;
        require_text("Payment phone number", &self.payment_phone, 20)?;
        require_text("Shipping address", &self.shipping.address, 200)?;
        require_text("Shipping city", &self.shipping.city, 50)?;
        require_text("Shipping postal code", &self.shipping.postal_code, 10)?;
        require_text("Shipping country", &self.shipping.country, 50)?;
        Ok(())
    }
}
