//! Relational persistence for the LocalStore backend.
//!
//! The [`Store`] trait is the persistence contract used by the domain layer.
//! [`PostgresStore`] is the production implementation; [`InMemoryStore`]
//! offers the same semantics for tests and database-less runs.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StorageError};
pub use memory::InMemoryStore;
pub use model::{
    NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetails, OrderItem, OrderLine,
    OrderStatus, Product, ProductChanges, Review, ShippingAddress, User, incremental_mean,
};
pub use postgres::PostgresStore;
pub use query::{OrderQuery, ProductQuery, ProductSort};
pub use store::Store;
