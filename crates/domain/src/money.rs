//! Money and discount value objects.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a value object from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Prices and totals cannot be negative.
    #[error("Invalid amount: {0} (must not be negative)")]
    NegativeAmount(Decimal),

    /// Discounts are percentages.
    #[error("Invalid discount: {0} (must be between 0 and 100)")]
    DiscountOutOfRange(Decimal),

    /// Review ratings are whole stars.
    #[error("Invalid rating: {0} (must be between 1 and 5)")]
    RatingOutOfRange(u8),
}

/// A non-negative amount of money.
///
/// Backed by a decimal so that sums of discounted prices never pick up
/// binary floating point error. Amounts keep full precision internally and
/// are only rounded for display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Creates an amount, rejecting negative values.
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValueError::NegativeAmount(amount));
        }
        Ok(Self(amount))
    }

    /// Creates an amount of whole currency units.
    pub fn from_major(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates an amount from minor units (1/100 of a unit).
    pub fn from_minor(minor: u64) -> Self {
        Self(Decimal::from(minor) / Decimal::ONE_HUNDRED)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the unrounded amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Applies a percentage discount: `amount × (100 − discount) / 100`.
    pub fn discounted(&self, discount: Discount) -> Money {
        Money(self.0 * (Decimal::ONE_HUNDRED - discount.percent()) / Decimal::ONE_HUNDRED)
    }

    /// Rounds half away from zero to two decimal places, fixed at scale 2.
    pub fn round_for_display(&self) -> Decimal {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.round_for_display())
    }
}

impl TryFrom<Decimal> for Money {
    type Error = ValueError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A percentage discount between 0 and 100 inclusive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
    /// Creates a discount, rejecting values outside 0..=100.
    pub fn new(percent: Decimal) -> Result<Self, ValueError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ValueError::DiscountOutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// Creates a whole-number discount.
    pub fn percent_of(percent: u8) -> Result<Self, ValueError> {
        Self::new(Decimal::from(percent))
    }

    /// No discount.
    pub fn none() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the percentage.
    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns true if the discount is non-zero.
    pub fn is_active(&self) -> bool {
        !self.0.is_zero()
    }
}

impl std::fmt::Display for Discount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}% OFF", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Discount {
    type Error = ValueError;

    fn try_from(percent: Decimal) -> Result<Self, Self::Error> {
        Discount::new(percent)
    }
}

impl From<Discount> for Decimal {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}
