//! Storefront workflow over an abstract document store.
//!
//! This crate provides:
//! - Catalog repository for reading product records
//! - Cart aggregate with derived totals and `CartService`
//! - Order workflow: checkout with compensation, status transitions and
//!   their presentation helpers
//! - Wishlist store and customer profiles
//!
//! Every operation takes the customer or order it acts on explicitly and
//! returns either the updated entity or a `DomainError` carrying an
//! `ErrorKind`.

pub mod cart;
pub mod catalog;
pub mod customer;
mod document;
pub mod error;
pub mod money;
pub mod order;
pub mod wishlist;

pub use cart::{Cart, CartError, CartLineItem, CartService, cart_total};
pub use catalog::{CatalogRepository, Product, Review, average_rating};
pub use common::{CustomerId, OrderId, ProductId};
pub use customer::{Address, CustomerProfile, ProfileDetails, ProfileService};
pub use error::{DomainError, ErrorKind};
pub use money::{Discount, Money, ValueError};
pub use order::{
    Order, OrderError, OrderService, OrderStatus, PaymentStatus, RefundStatus, StatusColor,
    StatusIcon, StatusPatch, TimelineStep, status_color, status_icon, timeline,
};
pub use wishlist::{WishlistEntry, WishlistStore};
