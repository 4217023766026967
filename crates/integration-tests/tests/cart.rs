//! Cart and checkout through the storefront endpoints, against a mocked
//! commerce backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::{StatusCode, header};
use frontieres_integration_tests::{TestContext, get, json_body, post_json, send, session_cookie};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_body() -> Value {
    json!({
        "access_token": "visitor-token",
        "refresh_token": "visitor-refresh",
        "expires_in": 14400
    })
}

fn wire_cart(quantity: u32) -> Value {
    json!({"cart": {
        "id": "cart-1",
        "currency": "EUR",
        "lineItems": [{
            "id": "line-1",
            "quantity": quantity,
            "catalogReference": {"catalogItemId": "prod-123"},
            "productName": {"original": "Mangue Kent"},
            "price": {"amount": "3.50"}
        }]
    }})
}

/// Commerce backend that issues visitor tokens and holds `current` as the
/// shopper's cart (`None` for no cart).
async fn commerce(current: Option<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    let cart_response = current.map_or_else(
        || ResponseTemplate::new(404).set_body_json(json!({"message": "Cart not found"})),
        |cart| ResponseTemplate::new(200).set_body_json(cart),
    );
    Mock::given(method("GET"))
        .and(path("/ecom/v1/carts/current"))
        .respond_with(cart_response)
        .mount(&server)
        .await;

    server
}

/// Open a session and return its cookie.
async fn open_session(app: &axum::Router) -> String {
    let response = send(app, get("/api/cart", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).unwrap()
}

#[tokio::test]
async fn test_add_to_cartless_session_creates_one_line() {
    let server = commerce(None).await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/add-to-cart"))
        .and(body_partial_json(json!({"lineItems": [{
            "catalogReference": {"catalogItemId": "prod-123"},
            "quantity": 1
        }]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_cart(1)))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let response = send(
        &ctx.app(),
        post_json("/api/cart/add", &json!({"productId": "prod-123", "quantity": 1}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let lines = body["cart"]["lineItems"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 1);
    assert_eq!(lines[0]["product"]["productId"], "prod-123");
    assert_eq!(body["itemCount"], 1);
}

#[tokio::test]
async fn test_update_to_zero_keeps_line_at_one() {
    let server = commerce(Some(wire_cart(3))).await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/update-line-items-quantity"))
        .and(body_partial_json(json!({"lineItems": [{"id": "line-1", "quantity": 1}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_cart(1)))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let app = ctx.app();
    let cookie = open_session(&app).await;

    let response = send(
        &app,
        post_json(
            "/api/cart/update",
            &json!({"lineItemId": "line-1", "quantity": 0}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let lines = body["cart"]["lineItems"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 1);
}

#[tokio::test]
async fn test_mutation_while_busy_is_rejected() {
    let server = commerce(Some(wire_cart(2))).await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/remove-line-items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cart": {"id": "cart-1", "currency": "EUR", "lineItems": []}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/add-to-cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_cart(3)))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let app = ctx.app();
    let cookie = open_session(&app).await;

    let remove = send(
        &app,
        post_json("/api/cart/remove", &json!({"lineItemId": "line-1"}), Some(&cookie)),
    );
    let add = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        send(
            &app,
            post_json("/api/cart/add", &json!({"productId": "prod-123"}), Some(&cookie)),
        )
        .await
    };
    let (removed, rejected) = tokio::join!(remove, add);

    assert_eq!(removed.status(), StatusCode::OK);
    assert_eq!(rejected.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(removed).await["cart"]["lineItems"], json!([]));

    // Accepted once the first call settled.
    let response = send(
        &app,
        post_json("/api/cart/add", &json!({"productId": "prod-123"}), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_other_sessions_are_not_blocked() {
    let server = commerce(None).await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/add-to-cart"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(wire_cart(1))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let app = ctx.app();
    let first = open_session(&app).await;
    let second = open_session(&app).await;
    assert_ne!(first, second);

    let body = json!({"productId": "prod-123"});
    let (a, b) = tokio::join!(
        send(&app, post_json("/api/cart/add", &body, Some(&first))),
        send(&app, post_json("/api/cart/add", &body, Some(&second))),
    );
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let server = commerce(None).await;
    Mock::given(method("POST"))
        .and(path("/ecom/v1/carts/current/add-to-cart"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let response = send(
        &ctx.app(),
        post_json("/api/cart/add", &json!({"productId": "prod-123"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "External service error");
}

#[tokio::test]
async fn test_blank_product_is_rejected() {
    let ctx = TestContext::new().with_commerce("http://127.0.0.1:9");
    let response = send(
        &ctx.app(),
        post_json("/api/cart/add", &json!({"productId": "  "}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_redirects_to_hosted_page() {
    let server = commerce(Some(wire_cart(2))).await;
    Mock::given(method("POST"))
        .and(path("/redirect-session/v1/redirect-session"))
        .and(body_partial_json(json!({
            "ecomCheckout": {"checkoutId": "cart-1"},
            "callbacks": {
                "postFlowUrl": "http://localhost:3000/success",
                "thankYouPageUrl": "http://localhost:3000/success"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "redirectSession": {"fullUrl": "https://checkout.example.com/s/abc"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = TestContext::new().with_commerce(&server.uri());
    let app = ctx.app();
    let cookie = open_session(&app).await;

    let response = send(&app, get("/checkout", Some(&cookie))).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://checkout.example.com/s/abc"
    );
}

#[tokio::test]
async fn test_checkout_of_empty_cart_is_rejected() {
    let server = commerce(None).await;
    let ctx = TestContext::new().with_commerce(&server.uri());

    let response = send(&ctx.app(), get("/checkout", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_shop() {
    let ctx = TestContext::new();
    let app = ctx.app();

    let response = send(&app, get("/api/cart", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cart"], Value::Null);
    assert_eq!(body["itemCount"], 0);

    let response = send(
        &app,
        post_json("/api/cart/add", &json!({"productId": "prod-123"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
