//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use document_store::InMemoryDocumentStore;
use domain::{Discount, Money, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> (
    axum::Router,
    Arc<api::AppState<InMemoryDocumentStore>>,
    InMemoryDocumentStore,
) {
    let store = InMemoryDocumentStore::new();
    let state = api::create_default_state(store.clone());

    let vase = Product::new(
        "vase",
        "Terracotta Vase",
        Money::from_major(1000),
        Discount::percent_of(10).unwrap(),
    )
    .with_category("pottery");
    let bowl = Product::new("bowl", "Glazed Bowl", Money::from_major(500), Discount::none())
        .with_category("pottery");
    let print = Product::new("print", "Block Print", Money::from_major(2500), Discount::none())
        .with_category("textiles")
        .with_availability(false);
    for product in [&vase, &bowl, &print] {
        state.catalog.put_product(product).await.unwrap();
    }

    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, store)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn add_to_cart(app: &axum::Router, customer: &str, product: &str, quantity: u32) {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            &format!("/customers/{customer}/cart/items"),
            serde_json::json!({ "product_id": product, "quantity": quantity }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn place_order(app: &axum::Router, customer: &str) -> String {
    let (status, json) = send(app, empty_request("POST", &format!("/customers/{customer}/orders"))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _, _) = setup().await;

    let response = app
        .oneshot(empty_request("GET", "/metrics"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_list_products_by_category() {
    let (app, _, _) = setup().await;

    let (status, all) = send(&app, empty_request("GET", "/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, pottery) = send(&app, empty_request("GET", "/products?category=pottery")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = pottery
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Terracotta Vase", "Glazed Bowl"]);
}

#[tokio::test]
async fn test_get_product() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, empty_request("GET", "/products/vase")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "vase");
    assert_eq!(json["price"], "1000.00");
    assert_eq!(json["discounted_price"], "900.00");
}

#[tokio::test]
async fn test_get_unknown_product_returns_404() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, empty_request("GET", "/products/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "NotFound");
}

#[tokio::test]
async fn test_put_product_then_read_it() {
    let (app, _, _) = setup().await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/products/lamp",
            serde_json::json!({
                "name": "Brass Lamp",
                "price": "1499.50",
                "discount": 20,
                "category": "lighting",
                "reviews": [{ "rating": 4, "text": "warm light" }, { "rating": 5 }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, empty_request("GET", "/products/lamp")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["discounted_price"], "1199.60");
    assert_eq!(json["average_rating"], 4.5);
    assert_eq!(json["review_count"], 2);
}

#[tokio::test]
async fn test_add_to_cart_computes_total() {
    let (app, _, _) = setup().await;

    add_to_cart(&app, "alice", "vase", 2).await;
    let (status, cart) = send(&app, empty_request("GET", "/customers/alice/cart")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["line_total"], "1800.00");
    assert_eq!(cart["item_count"], 2);
    assert_eq!(cart["total"], "1800.00");
}

#[tokio::test]
async fn test_add_unavailable_product_is_rejected() {
    let (app, _, _) = setup().await;

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/customers/alice/cart/items",
            serde_json::json!({ "product_id": "print" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "ValidationError");
}

#[tokio::test]
async fn test_missing_cart_returns_404() {
    let (app, _, _) = setup().await;

    let (status, _) = send(&app, empty_request("GET", "/customers/nobody/cart")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quantity_to_zero_requires_confirmation() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "bowl", 1).await;

    let (status, json) = send(
        &app,
        json_request(
            "PATCH",
            "/customers/alice/cart/items/bowl",
            serde_json::json!({ "delta": -1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "ValidationError");

    let (status, cart) = send(
        &app,
        json_request(
            "PATCH",
            "/customers/alice/cart/items/bowl",
            serde_json::json!({ "delta": -1, "confirm_removal": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["total"], "0.00");
}

#[tokio::test]
async fn test_remove_item_and_clear() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "vase", 1).await;
    add_to_cart(&app, "alice", "bowl", 3).await;

    let (status, cart) = send(&app, empty_request("DELETE", "/customers/alice/cart/items/vase")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total"], "1500.00");

    let (status, cart) = send(&app, empty_request("DELETE", "/customers/alice/cart")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_creates_order_and_empties_cart() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "vase", 1).await;
    add_to_cart(&app, "alice", "bowl", 2).await;

    let order_id = place_order(&app, "alice").await;

    let (status, order) = send(&app, empty_request("GET", &format!("/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["total"], "1900.00");
    assert_eq!(order["order_status"], "Pending");
    assert_eq!(order["payment_status"], "NotRequested");
    assert_eq!(order["refund"], "none");
    assert_eq!(order["can_cancel"], true);

    let (_, cart) = send(&app, empty_request("GET", "/customers/alice/cart")).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (status, orders) = send(&app, empty_request("GET", "/customers/alice/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_conflict() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "bowl", 1).await;
    send(&app, empty_request("DELETE", "/customers/alice/cart")).await;

    let (status, json) = send(&app, empty_request("POST", "/customers/alice/orders")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "InvalidTransition");
}

#[tokio::test]
async fn test_paid_order_cancellation_requests_refund() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "vase", 1).await;
    let order_id = place_order(&app, "alice").await;

    let (status, order) = send(&app, empty_request("POST", &format!("/orders/{order_id}/payment"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_status"], "AwaitingApproval");

    let (status, order) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{order_id}/payment/outcome"),
            serde_json::json!({ "succeeded": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_status"], "Succeeded");

    let (status, order) = send(&app, empty_request("POST", &format!("/orders/{order_id}/cancel"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_status"], "Cancelled");
    assert_eq!(order["refund"], "requested");

    let (status, order) = send(
        &app,
        empty_request("POST", &format!("/orders/{order_id}/refund/complete")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["refund"], "complete");
}

#[tokio::test]
async fn test_advance_status_one_step_at_a_time() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "bowl", 1).await;
    let order_id = place_order(&app, "alice").await;
    let uri = format!("/orders/{order_id}/status");

    let (status, order) = send(
        &app,
        json_request("POST", &uri, serde_json::json!({ "status": "Received" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_status"], "Received");

    let (status, json) = send(
        &app,
        json_request("POST", &uri, serde_json::json!({ "status": "Delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "InvalidTransition");

    let (status, _) = send(
        &app,
        json_request("POST", &uri, serde_json::json!({ "status": "Cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "bowl", 1).await;
    let order_id = place_order(&app, "alice").await;
    let uri = format!("/orders/{order_id}/status");
    for status in ["Received", "Dispatched", "Delivered"] {
        let (code, _) = send(
            &app,
            json_request("POST", &uri, serde_json::json!({ "status": status })),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
    }

    let (status, json) = send(&app, empty_request("POST", &format!("/orders/{order_id}/cancel"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "InvalidTransition");
}

#[tokio::test]
async fn test_order_timeline() {
    let (app, _, _) = setup().await;
    add_to_cart(&app, "alice", "bowl", 1).await;
    let order_id = place_order(&app, "alice").await;
    send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{order_id}/status"),
            serde_json::json!({ "status": "Received" }),
        ),
    )
    .await;

    let (status, json) = send(&app, empty_request("GET", &format!("/orders/{order_id}/timeline"))).await;

    assert_eq!(status, StatusCode::OK);
    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["icon"], "clock");
    assert_eq!(steps[1]["color"], "reached");
    assert_eq!(steps[2]["color"], "upcoming");
    assert_eq!(steps[3]["icon"], "check-circle");
}

#[tokio::test]
async fn test_wishlist_add_is_idempotent_and_remove_is_noop_when_absent() {
    let (app, _, _) = setup().await;
    let add = || {
        json_request(
            "POST",
            "/customers/alice/wishlist",
            serde_json::json!({ "product_id": "vase" }),
        )
    };

    let (status, entry) = send(&app, add()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["product"]["id"], "vase");
    send(&app, add()).await;

    let (_, list) = send(&app, empty_request("GET", "/customers/alice/wishlist")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    for _ in 0..2 {
        let (status, _) = send(&app, empty_request("DELETE", "/customers/alice/wishlist/vase")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, list) = send(&app, empty_request("GET", "/customers/alice/wishlist")).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_update_validates_and_saves() {
    let (app, _, _) = setup().await;

    let (status, json) = send(
        &app,
        json_request(
            "PUT",
            "/customers/alice/profile",
            serde_json::json!({ "name": "Alice", "email": "not-an-email", "phone": "9876543210" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "ValidationError");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/customers/alice/profile",
            serde_json::json!({
                "name": "Alice",
                "email": "alice@example.com",
                "phone": "9876543210",
                "addresses": [{ "addressLine1": "12 Park Street", "pincode": "700016" }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = send(&app, empty_request("GET", "/customers/alice/profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "alice@example.com");
    assert_eq!(profile["addresses"][0]["pincode"], "700016");
    assert!(profile["joinedAt"].is_string());
}

#[tokio::test]
async fn test_unavailable_store_returns_503_with_retry_after() {
    let (app, _, store) = setup().await;
    store.set_unavailable(true).await;

    let response = app
        .oneshot(empty_request("GET", "/products/vase"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "1");
}

#[tokio::test]
async fn test_checkout_records_metrics() {
    let (app, state, _) = setup().await;
    add_to_cart(&app, "metrics-customer", "vase", 1).await;
    place_order(&app, "metrics-customer").await;

    let orders = state
        .orders
        .list_orders(&domain::CustomerId::new("metrics-customer"))
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);

    let response = app
        .oneshot(empty_request("GET", "/metrics"))
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_placed_total"));
    assert!(text.contains("cart_mutations_total"));
}
