//! HTTP API server with observability for the storefront workflow.
//!
//! Exposes the catalog, cart, checkout, order administration, wishlist and
//! profile operations as REST endpoints, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use document_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route(
            "/products/{product_id}",
            get(routes::products::get::<S>).put(routes::products::put::<S>),
        )
        .route(
            "/customers/{customer_id}/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route(
            "/customers/{customer_id}/cart/items",
            post(routes::cart::add_item::<S>),
        )
        .route(
            "/customers/{customer_id}/cart/items/{product_id}",
            patch(routes::cart::change_quantity::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route(
            "/customers/{customer_id}/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/customers/{customer_id}/wishlist",
            get(routes::wishlist::list::<S>).post(routes::wishlist::add::<S>),
        )
        .route(
            "/customers/{customer_id}/wishlist/{product_id}",
            axum::routing::delete(routes::wishlist::remove::<S>),
        )
        .route(
            "/customers/{customer_id}/profile",
            get(routes::profile::get::<S>).put(routes::profile::update::<S>),
        )
        .route("/orders/{order_id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{order_id}/timeline",
            get(routes::orders::timeline::<S>),
        )
        .route("/orders/{order_id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{order_id}/payment",
            post(routes::orders::payment_attempt::<S>),
        )
        .route(
            "/orders/{order_id}/payment/outcome",
            post(routes::orders::payment_outcome::<S>),
        )
        .route(
            "/orders/{order_id}/status",
            post(routes::orders::advance_status::<S>),
        )
        .route(
            "/orders/{order_id}/refund/complete",
            post(routes::orders::complete_refund::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a document store.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

/// Registers descriptions for the metrics the workflow emits.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "store_operations_total",
        "Document store calls, labelled by operation"
    );
    metrics::describe_counter!(
        "cart_mutations_total",
        "Cart writes, labelled by operation"
    );
    metrics::describe_counter!("orders_placed_total", "Orders created at checkout");
    metrics::describe_counter!(
        "order_compensations_total",
        "Checkouts rolled back because the cart could not be cleared"
    );
    metrics::describe_counter!(
        "order_transitions_total",
        "Order status changes, labelled by transition"
    );
    metrics::describe_histogram!(
        "order_placement_duration_seconds",
        metrics::Unit::Seconds,
        "Time to place an order"
    );
}
