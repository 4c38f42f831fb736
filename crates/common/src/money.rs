//! Money amounts stored as integer minor units.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Money amount represented in minor units (paisa/cents) to keep totals exact.
///
/// The HTTP boundary speaks decimal major units; conversion happens through
/// [`Money::try_from_major`] and [`Money::as_major`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from a decimal major-unit value, rounding to the
    /// nearest minor unit.
    ///
    /// Returns `None` for non-finite values and values outside the `i64`
    /// minor-unit range.
    pub fn try_from_major(major: f64) -> Option<Self> {
        let minor = (major * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
        if !minor.is_finite() || minor < i64::MIN as f64 || minor >= i64::MAX as f64 {
            return None;
        }
        Some(Self(minor as i64))
    }

    /// Creates an amount from a known-good major-unit literal.
    ///
    /// Saturates at the `i64` bounds; input from clients goes through
    /// [`Money::try_from_major`].
    pub fn from_major(major: f64) -> Self {
        Self((major * 100.0).round() as i64)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a decimal major-unit value.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns true if the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies the amount by a line quantity.
    ///
    /// Panics on overflow in debug builds; totals built from client input use
    /// [`Money::checked_times`].
    pub const fn times(&self, quantity: i32) -> Self {
        Self(self.0 * quantity as i64)
    }

    /// Multiplies the amount by a line quantity, returning `None` on overflow.
    pub const fn checked_times(&self, quantity: i32) -> Option<Self> {
        match self.0.checked_mul(quantity as i64) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    pub const fn checked_add(&self, rhs: Money) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", self.0.abs() / 100, self.0.abs() % 100)
    }
}
