use axum::http::{Method, StatusCode};
use serde_json::json;
use shared::{domain::Role, error::ErrorCode};

use super::*;
use crate::mock_backend::{user_json, MockBackend};

#[tokio::test]
async fn fetches_profile_by_email_without_exposing_password() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    mock.json(
        Method::GET,
        "/api/users/email/jane@example.com",
        StatusCode::OK,
        user_json(3, "Jane", "jane@example.com", "manager"),
    )
    .await;

    let backend = mock.http_backend();
    let user = backend
        .user_by_email("jane@example.com")
        .await
        .expect("profile");
    assert_eq!(user.id, UserId(3));
    assert_eq!(user.role, Some(Role::Manager));
    assert!(!format!("{user:?}").contains("not-for-the-client"));
}

#[tokio::test]
async fn attaches_bearer_token_while_set() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    mock.json(Method::GET, "/api/products", StatusCode::OK, json!([]))
        .await;

    let backend = mock.http_backend();
    backend.list_products().await.expect("anonymous call");
    backend.set_token(Some("opaque-token".into()));
    backend.list_products().await.expect("authorized call");
    backend.set_token(None);
    backend.list_products().await.expect("cleared call");

    let auth: Vec<Option<String>> = mock
        .requests()
        .await
        .into_iter()
        .map(|r| r.authorization)
        .collect();
    assert_eq!(
        auth,
        vec![None, Some("Bearer opaque-token".to_string()), None]
    );
}

#[tokio::test]
async fn error_bodies_map_to_the_taxonomy() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    mock.json(
        Method::POST,
        "/api/users/login",
        StatusCode::UNAUTHORIZED,
        json!({ "error": "Invalid email or password" }),
    )
    .await;
    mock.text(
        Method::POST,
        "/api/inventory/stock-out",
        StatusCode::CONFLICT,
        "Insufficient stock. Available: 2",
    )
    .await;
    mock.json(
        Method::GET,
        "/api/inventory",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    )
    .await;

    let backend = mock.http_backend();

    let err = backend
        .login(&LoginRequest {
            email: "a@b.co".into(),
            password: "secret".into(),
        })
        .await
        .expect_err("login must fail");
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.user_message(), "Invalid email or password");

    let err = backend
        .adjust_stock(
            StockDirection::Out,
            &StockAdjustmentRequest {
                product_id: ProductId(1),
                warehouse_id: WarehouseId(2),
                quantity: 5,
                performed_by_email: "e@x.co".into(),
            },
        )
        .await
        .expect_err("stock-out must fail");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.server_message(), Some("Insufficient stock. Available: 2"));

    let err = backend.list_inventory().await.expect_err("5xx");
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.user_message(), "Server error. Please try again later.");

    let err = backend.list_suppliers().await.expect_err("unscripted");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    mock.text(Method::GET, "/api/users", StatusCode::OK, "<html>oops</html>")
        .await;

    let err = mock
        .http_backend()
        .list_users()
        .await
        .expect_err("decode failure");
    assert_eq!(err.code, ErrorCode::Decode);
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpBackend::new(&BackendConfig {
        base_url: format!("http://{addr}"),
        request_timeout: Duration::from_secs(2),
    })
    .expect("backend");
    let err = backend.list_products().await.expect_err("no server");
    assert_eq!(err.code, ErrorCode::Transport);
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn crud_calls_use_id_paths_and_camel_case_bodies() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    mock.json(
        Method::PUT,
        "/api/products/9",
        StatusCode::OK,
        json!({ "id": 9, "name": "Bolt", "sku": "B-1", "price": "2.50" }),
    )
    .await;
    mock.json(Method::DELETE, "/api/warehouses/4", StatusCode::OK, json!(null))
        .await;
    mock.json(Method::POST, "/api/inventory/stock-in", StatusCode::OK, json!({ "id": 1 }))
        .await;

    let backend = mock.http_backend();
    let product = backend
        .update_product(
            ProductId(9),
            &ProductInput {
                name: "Bolt".into(),
                sku: "B-1".into(),
                category: None,
                unit: None,
                price: Some(2.5),
                description: None,
                supplier: None,
                min_stock_level: Some(4),
            },
        )
        .await
        .expect("update");
    assert_eq!(product.price, Some(2.5));

    backend
        .delete_warehouse(WarehouseId(4))
        .await
        .expect("delete");

    backend
        .adjust_stock(
            StockDirection::In,
            &StockAdjustmentRequest {
                product_id: ProductId(9),
                warehouse_id: WarehouseId(4),
                quantity: 3,
                performed_by_email: "e@x.co".into(),
            },
        )
        .await
        .expect("stock-in");

    let product_body = mock
        .last_body(Method::PUT, "/api/products/9")
        .await
        .expect("product body");
    assert_eq!(product_body["minStockLevel"], json!(4));
    let stock_body = mock
        .last_body(Method::POST, "/api/inventory/stock-in")
        .await
        .expect("stock body");
    assert_eq!(
        stock_body,
        json!({
            "productId": 9,
            "warehouseId": 4,
            "quantity": 3,
            "performedByEmail": "e@x.co"
        })
    );
}

#[test]
fn base_url_path_prefix_is_kept() {
    let backend = HttpBackend::new(&BackendConfig {
        base_url: "http://inventory.local/backend/".into(),
        request_timeout: DEFAULT_REQUEST_TIMEOUT,
    })
    .expect("backend");
    let url = backend
        .endpoint(&["api", "users", "email", "a b@x.co"])
        .expect("url");
    assert_eq!(
        url.as_str(),
        "http://inventory.local/backend/api/users/email/a%20b@x.co"
    );
}

#[test]
fn rejects_unusable_base_urls() {
    for raw in ["not a url", "mailto:ops@example.com"] {
        let config = BackendConfig {
            base_url: raw.into(),
            ..BackendConfig::default()
        };
        assert!(HttpBackend::new(&config).is_err(), "{raw} should be rejected");
    }
}
