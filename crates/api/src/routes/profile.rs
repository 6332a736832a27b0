//! Customer profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use document_store::DocumentStore;
use domain::{CustomerId, CustomerProfile, ProfileDetails};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /customers/{customer_id}/profile: load the profile.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerProfile>, ApiError> {
    let profile = state
        .profiles
        .get_profile(&CustomerId::new(customer_id))
        .await?;
    Ok(Json(profile))
}

/// PUT /customers/{customer_id}/profile: validate and save the profile.
#[tracing::instrument(skip(state, details))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
    Json(details): Json<ProfileDetails>,
) -> Result<Json<CustomerProfile>, ApiError> {
    let profile = state
        .profiles
        .update_profile(&CustomerId::new(customer_id), details)
        .await?;
    Ok(Json(profile))
}
