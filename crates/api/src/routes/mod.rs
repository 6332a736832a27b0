//! HTTP route handlers.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod profile;
pub mod wishlist;

use domain::Money;

/// Formats an amount for a response body, e.g. `"900.00"`.
pub(crate) fn money(amount: Money) -> String {
    amount.round_for_display().to_string()
}
