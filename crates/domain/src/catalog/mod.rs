//! Read access to catalog products.

mod repository;

pub use repository::CatalogRepository;

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::{Discount, Money, ValueError};

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating, 1 to 5.
    pub rating: u8,

    /// Free-form review text.
    #[serde(default)]
    pub text: String,
}

impl Review {
    /// Creates a review, rejecting ratings outside 1..=5.
    pub fn new(rating: u8, text: impl Into<String>) -> Result<Self, ValueError> {
        if !(1..=5).contains(&rating) {
            return Err(ValueError::RatingOutOfRange(rating));
        }
        Ok(Self {
            rating,
            text: text.into(),
        })
    }
}

/// A catalog product.
///
/// Products are owned by catalog management; the cart and orders only ever
/// copy the fields they need at the moment a product is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier, the key of the product document.
    #[serde(skip)]
    pub id: ProductId,

    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub discount: Discount,

    /// Image URIs, cover image first.
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub category: String,

    /// Whether the product can currently be bought.
    #[serde(default = "default_availability")]
    pub availability: bool,

    #[serde(default)]
    pub medium: String,

    #[serde(default)]
    pub dimensions: String,

    #[serde(default)]
    pub reviews: Vec<Review>,
}

fn default_availability() -> bool {
    true
}

impl Product {
    /// Creates an available product with no images or reviews.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        discount: Discount,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            discount,
            images: Vec::new(),
            category: String::new(),
            availability: true,
            medium: String::new(),
            dimensions: String::new(),
            reviews: Vec::new(),
        }
    }

    /// Sets the images.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the availability flag.
    pub fn with_availability(mut self, availability: bool) -> Self {
        self.availability = availability;
        self
    }

    /// Sets the reviews.
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = reviews;
        self
    }

    /// Price after discount.
    pub fn discounted_price(&self) -> Money {
        self.price.discounted(self.discount)
    }

    /// The cover image, if any.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Mean review rating, 0 when there are no reviews.
    pub fn average_rating(&self) -> f64 {
        average_rating(&self.reviews)
    }

    /// Checks invariants serde cannot express.
    pub(crate) fn validate(&self) -> Result<(), ValueError> {
        for review in &self.reviews {
            if !(1..=5).contains(&review.rating) {
                return Err(ValueError::RatingOutOfRange(review.rating));
            }
        }
        Ok(())
    }
}

/// Mean rating of a set of reviews, 0 when empty.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / reviews.len() as f64
}
