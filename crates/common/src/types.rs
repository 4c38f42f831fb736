use serde::{Deserialize, Serialize};

/// Declares a numeric row identifier newtype.
///
/// Each entity gets its own id type so a `ProductId` can never be passed
/// where an `OrderId` is expected.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database id.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Identifier of a catalog product.
    ProductId
);
row_id!(
    /// Identifier of a customer record.
    UserId
);
row_id!(
    /// Internal identifier of an order (distinct from the human-facing order number).
    OrderId
);
row_id!(
    /// Identifier of a single order line.
    OrderItemId
);
row_id!(
    /// Identifier of a product review.
    ReviewId
);
