//! Customer profiles stored in the `customers` collection.

use chrono::{DateTime, Utc};
use common::{CustomerId, DocumentKey};
use document_store::{Collection, DocumentStore, DocumentStoreExt, UpdateOptions};
use serde::{Deserialize, Serialize};

use crate::document::{decode, encode};
use crate::error::DomainError;

/// A delivery address.
///
/// Stored addresses may be partially filled in; `ProfileDetails::validate`
/// enforces the required fields on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Address {
    pub address_line1: String,
    pub address_line2: String,
    pub pincode: String,
    pub post_office: String,
    pub district: String,
    pub region: String,
    pub state: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ProfileDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub addresses: Vec<Address>,
}

impl ProfileDetails {
    /// Checks every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if !is_digits(&self.phone, 10) {
            return Err(DomainError::Validation(
                "phone number must be 10 digits".to_string(),
            ));
        }
        for (index, address) in self.addresses.iter().enumerate() {
            if address.address_line1.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "address {index}: first line is required"
                )));
            }
            if !is_digits(&address.pincode, 6) {
                return Err(DomainError::Validation(format!(
                    "address {index}: pincode must be 6 digits"
                )));
            }
        }
        Ok(())
    }
}

/// A customer's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(skip)]
    pub customer_id: CustomerId,

    #[serde(flatten)]
    pub details: ProfileDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Reads and writes customer profiles.
#[derive(Clone)]
pub struct ProfileService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads a customer's profile.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_profile(&self, customer_id: &CustomerId) -> Result<CustomerProfile, DomainError> {
        let doc = self
            .store
            .get(Collection::Customers, &DocumentKey::from(customer_id))
            .await?;
        let mut profile: CustomerProfile = decode(&doc)?;
        profile.customer_id = customer_id.clone();
        Ok(profile)
    }

    /// Validates and saves a profile, creating it if the customer has none.
    #[tracing::instrument(skip(self, details), fields(customer_id = %customer_id))]
    pub async fn update_profile(
        &self,
        customer_id: &CustomerId,
        details: ProfileDetails,
    ) -> Result<CustomerProfile, DomainError> {
        if customer_id.is_blank() {
            return Err(DomainError::Validation("customer id is required".to_string()));
        }
        details.validate()?;

        let key = DocumentKey::from(customer_id);
        let existing = self.store.get_optional(Collection::Customers, &key).await?;

        let profile = match existing {
            Some(doc) => {
                let current: CustomerProfile = decode(&doc)?;
                let profile = CustomerProfile {
                    customer_id: customer_id.clone(),
                    details,
                    joined_at: current.joined_at,
                };
                self.store
                    .update(
                        Collection::Customers,
                        &key,
                        encode(Collection::Customers, &profile.details)?,
                        UpdateOptions::expect_version(doc.version),
                    )
                    .await?;
                profile
            }
            None => {
                let profile = CustomerProfile {
                    customer_id: customer_id.clone(),
                    details,
                    joined_at: Some(Utc::now()),
                };
                self.store
                    .put(
                        Collection::Customers,
                        &key,
                        encode(Collection::Customers, &profile)?,
                    )
                    .await?;
                profile
            }
        };

        tracing::info!("Profile updated");
        Ok(profile)
    }
}
