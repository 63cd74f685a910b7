use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::*;
use crate::{
    credential_store::MemoryCredentialStore,
    mock_backend::{user_json, MockBackend},
};

fn session_for(mock: &MockBackend) -> SessionManager {
    let backend: Arc<dyn InventoryBackend> = Arc::new(mock.http_backend());
    SessionManager::new(backend, Arc::new(MemoryCredentialStore::new()))
}

async fn signed_in(mock: &MockBackend, email: &str, role: &str) -> SessionManager {
    mock.json(
        Method::POST,
        "/api/users/login",
        StatusCode::OK,
        json!({ "email": email, "token": "t-1" }),
    )
    .await;
    mock.json(
        Method::GET,
        &format!("/api/users/email/{email}"),
        StatusCode::OK,
        user_json(4, "Sam", email, role),
    )
    .await;
    let session = session_for(mock);
    session.login(email, "secret1").await.expect("login");
    session
}

fn inventory_json() -> Value {
    json!([
        {
            "id": 1,
            "product": { "id": 3, "name": "Bolt", "sku": "B-1", "price": 2.5 },
            "warehouse": { "id": 1, "name": "North" },
            "stockLevel": 8
        },
        {
            "id": 2,
            "product": { "id": 3, "name": "Bolt", "sku": "B-1", "price": 2.5 },
            "warehouse": { "id": 2, "name": "South" },
            "stockLevel": 1
        },
        {
            "id": 3,
            "product": { "id": 7, "name": "Nut", "sku": "N-7", "price": "0.5" },
            "warehouse": { "id": 1, "name": "North" },
            "stockLevel": 12
        }
    ])
}

fn history_json() -> Value {
    json!([
        { "id": 1, "adjustmentType": "ADD", "adjustmentQuantity": 5, "timestamp": "2026-10-10T09:00:00" },
        { "id": 2, "adjustmentType": "REMOVE", "adjustmentQuantity": 2, "timestamp": "2026-06-01T09:00:00" },
        { "id": 3, "adjustmentType": "ADD", "adjustmentQuantity": 1 }
    ])
}

#[tokio::test]
async fn admit_requires_the_exact_role() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let anonymous = session_for(&mock);
    anonymous.logout();
    let err = admit(&anonymous, &Role::Manager).await.expect_err("anonymous");
    assert_eq!(err.decision, GuardDecision::RedirectToLogin);

    let employee = signed_in(&mock, "e@example.com", "EMPLOYEE").await;
    let err = admit(&employee, &Role::Admin).await.expect_err("wrong role");
    assert_eq!(err.decision, GuardDecision::RedirectToLanding);
    assert_eq!(err.required, Role::Admin);

    let user = admit(&employee, &Role::Employee).await.expect("employee");
    assert_eq!(user.email, "e@example.com");
}

#[tokio::test]
async fn denied_dashboard_never_fetches() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "e@example.com", "EMPLOYEE").await;
    let before = mock.requests().await.len();

    let mut dashboard = ManagerDashboard::new(Arc::clone(session.backend()));
    assert!(dashboard.load(&session).await.is_err());
    assert_eq!(mock.requests().await.len(), before);
    assert!(!dashboard.inventory.is_loaded());
}

#[tokio::test]
async fn manager_load_fills_every_view() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "m@example.com", "MANAGER").await;
    mock.json(
        Method::GET,
        "/api/products",
        StatusCode::OK,
        json!([{ "id": 3, "name": "Bolt", "sku": "B-1" }]),
    )
    .await;
    mock.json(
        Method::GET,
        "/api/suppliers",
        StatusCode::OK,
        json!([{ "id": 1, "name": "Acme" }]),
    )
    .await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, inventory_json())
        .await;
    mock.json(Method::GET, "/api/inventory/history", StatusCode::OK, history_json())
        .await;

    let mut dashboard = ManagerDashboard::new(Arc::clone(session.backend()));
    dashboard.load(&session).await.expect("manager load");

    assert_eq!(dashboard.user().map(|u| u.email.as_str()), Some("m@example.com"));
    assert_eq!(dashboard.products.items().len(), 1);
    assert_eq!(dashboard.suppliers.items()[0].name, "Acme");

    let metrics = dashboard.metrics();
    assert_eq!(metrics.total_units, 21);
    assert_eq!(metrics.low_stock, 2);
    assert_eq!(metrics.critical, 1);
    assert_eq!(metrics.warehouses, 2);
    assert!((metrics.total_value - 28.5).abs() < 1e-9);

    let consolidated = dashboard.consolidated();
    assert_eq!(consolidated[0].product_id(), ProductId(7));
    assert_eq!(consolidated[0].total, 12);
    assert_eq!(consolidated[1].total, 9);
    assert_eq!(consolidated[1].locations, 2);

    let export = dashboard.export_inventory();
    assert_eq!(export.stem, "inventory_levels");
    assert_eq!(export.rows[1], vec!["Bolt", "South", "1", "2.5", "2.5"]);

    let now = NaiveDate::from_ymd_opt(2026, 10, 17)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid date");
    let month = dashboard.movement(now);
    assert_eq!((month.stock_in, month.stock_out, month.total), (1, 0, 1));
    let all_time = dashboard.movement_all_time(now);
    assert_eq!((all_time.stock_in, all_time.stock_out, all_time.total), (2, 1, 3));

    let recent = dashboard.recent_history(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id.0, 1);
}

#[tokio::test]
async fn admin_load_keeps_partial_failures_isolated() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "a@example.com", "ADMIN").await;
    mock.json(
        Method::GET,
        "/api/users",
        StatusCode::OK,
        json!([
            user_json(1, "Ann", "ann@example.com", "ADMIN"),
            user_json(2, "Bo", "bo@example.com", "manager"),
            user_json(3, "Cy", "cy@example.com", "EMPLOYEE"),
            user_json(4, "Di", "di@example.com", "EMPLOYEE")
        ]),
    )
    .await;
    mock.json(
        Method::GET,
        "/api/warehouses",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "warehouse table locked" }),
    )
    .await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, inventory_json())
        .await;
    mock.json(
        Method::GET,
        "/api/alerts/active",
        StatusCode::OK,
        json!([{ "id": 5, "currentStock": 1 }]),
    )
    .await;

    let mut dashboard = AdminDashboard::new(Arc::clone(session.backend()));
    dashboard.load(&session).await.expect("admin load");

    let counts = dashboard.role_counts();
    assert_eq!(counts.total, 4);
    assert_eq!((counts.admins, counts.managers, counts.employees), (1, 1, 2));

    assert!(dashboard.warehouses.items().is_empty());
    assert_eq!(dashboard.warehouses.error(), Some("warehouse table locked"));
    // unscripted endpoints fail with 404, which leaves an empty view
    assert!(dashboard.products.error().is_some());

    assert_eq!(dashboard.low_stock().len(), 3);
    assert_eq!(dashboard.metrics().low_stock, 3);
    assert_eq!(dashboard.active_alerts().await.len(), 1);
}

#[tokio::test]
async fn saving_a_warehouse_reloads_the_list() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "a@example.com", "ADMIN").await;
    mock.json(
        Method::POST,
        "/api/warehouses",
        StatusCode::OK,
        json!({ "id": 9, "name": "East", "location": "Dock 4" }),
    )
    .await;
    mock.json(
        Method::GET,
        "/api/warehouses",
        StatusCode::OK,
        json!([{ "id": 9, "name": "East", "location": "Dock 4" }]),
    )
    .await;

    let mut dashboard = AdminDashboard::new(Arc::clone(session.backend()));
    let input = WarehouseInput {
        name: "East".into(),
        location: Some("Dock 4".into()),
    };
    let saved = dashboard
        .save_warehouse(None, &input)
        .await
        .expect("create warehouse");
    assert_eq!(saved.id, WarehouseId(9));
    assert_eq!(dashboard.warehouses.items(), &[saved]);
    assert_eq!(
        mock.last_body(Method::POST, "/api/warehouses").await,
        Some(json!({ "name": "East", "location": "Dock 4" }))
    );
}

#[tokio::test]
async fn failed_delete_does_not_refetch() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "m@example.com", "MANAGER").await;
    mock.json(
        Method::DELETE,
        "/api/suppliers/3",
        StatusCode::CONFLICT,
        json!({ "error": "Supplier has products" }),
    )
    .await;

    let mut dashboard = ManagerDashboard::new(Arc::clone(session.backend()));
    let err = dashboard
        .delete_supplier(SupplierId(3))
        .await
        .expect_err("conflict");
    assert_eq!(err.user_message(), "Supplier has products");
    assert_eq!(mock.hits(Method::GET, "/api/suppliers").await, 0);
}

#[tokio::test]
async fn stock_out_conflict_is_shown_verbatim_and_inventory_is_kept() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "e@example.com", "EMPLOYEE").await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, inventory_json())
        .await;
    mock.json(Method::GET, "/api/inventory/history", StatusCode::OK, history_json())
        .await;
    mock.json(
        Method::GET,
        "/api/products/dropdown",
        StatusCode::OK,
        json!([{ "id": 3, "name": "Bolt" }]),
    )
    .await;
    mock.json(
        Method::GET,
        "/api/warehouses/dropdown",
        StatusCode::OK,
        json!([{ "id": 2, "name": "South" }]),
    )
    .await;
    mock.text(
        Method::POST,
        "/api/inventory/stock-out",
        StatusCode::CONFLICT,
        "Insufficient stock. Available: 1",
    )
    .await;

    let mut dashboard = EmployeeDashboard::new(Arc::clone(session.backend()));
    dashboard.load(&session).await.expect("employee load");
    assert_eq!(dashboard.product_options.len(), 1);
    assert_eq!(dashboard.warehouse_options[0].name, "South");
    let before = dashboard.inventory.items().to_vec();

    let err = dashboard
        .adjust_stock(
            StockDirection::Out,
            &StockForm::new(ProductId(3), WarehouseId(2), 5),
        )
        .await
        .expect_err("insufficient stock");
    assert_eq!(err.to_string(), "Insufficient stock. Available: 1");
    assert_eq!(dashboard.inventory.items(), before.as_slice());
    assert_eq!(mock.hits(Method::GET, "/api/inventory").await, 1);
    assert_eq!(mock.hits(Method::GET, "/api/inventory/history").await, 1);
}

#[tokio::test]
async fn stock_in_refreshes_inventory_and_history() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let session = signed_in(&mock, "e@example.com", "EMPLOYEE").await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, json!([]))
        .await;
    mock.json(Method::GET, "/api/inventory/history", StatusCode::OK, json!([]))
        .await;

    let mut dashboard = EmployeeDashboard::new(Arc::clone(session.backend()));
    dashboard.load(&session).await.expect("employee load");
    assert!(dashboard.product_options.is_empty());

    mock.json(
        Method::POST,
        "/api/inventory/stock-in",
        StatusCode::OK,
        json!({ "id": 1, "stockLevel": 5 }),
    )
    .await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, inventory_json())
        .await;
    mock.json(Method::GET, "/api/inventory/history", StatusCode::OK, history_json())
        .await;

    let message = dashboard
        .adjust_stock(
            StockDirection::In,
            &StockForm::new(ProductId(3), WarehouseId(1), 5),
        )
        .await
        .expect("stock-in");
    assert_eq!(message, "Stock-In recorded successfully!");
    assert_eq!(dashboard.inventory.items().len(), 3);
    assert_eq!(dashboard.history.items().len(), 3);

    let body = mock
        .last_body(Method::POST, "/api/inventory/stock-in")
        .await
        .expect("stock-in body");
    assert_eq!(body["performedByEmail"], json!("e@example.com"));
}

#[tokio::test]
async fn adjusting_before_load_is_refused() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let backend: Arc<dyn InventoryBackend> = Arc::new(mock.http_backend());
    let mut dashboard = EmployeeDashboard::new(backend);

    let err = dashboard
        .adjust_stock(
            StockDirection::In,
            &StockForm::new(ProductId(3), WarehouseId(1), 5),
        )
        .await
        .expect_err("no user");
    assert!(matches!(err, StockError::Rejected { .. }));
    assert!(mock.requests().await.is_empty());
}

#[tokio::test]
async fn warehouse_details_prices_every_catalog_product() {
    let mock = MockBackend::spawn().await.expect("spawn server");
    let manager = signed_in(&mock, "m@example.com", "MANAGER").await;
    let mut denied = WarehouseDetails::new(Arc::clone(manager.backend()));
    assert!(denied.load(&manager).await.is_err());

    let session = signed_in(&mock, "a@example.com", "ADMIN").await;
    mock.json(
        Method::GET,
        "/api/products",
        StatusCode::OK,
        json!([
            { "id": 3, "name": "Bolt", "sku": "B-1", "price": 2.5 },
            { "id": 7, "name": "Nut", "sku": "N-7", "price": 0.5 },
            { "id": 11, "name": "Gear", "sku": "G-11", "price": 4 }
        ]),
    )
    .await;
    mock.json(
        Method::GET,
        "/api/warehouses",
        StatusCode::OK,
        json!([{ "id": 1, "name": "North" }, { "id": 2, "name": "South" }]),
    )
    .await;
    mock.json(Method::GET, "/api/inventory", StatusCode::OK, inventory_json())
        .await;

    let mut details = WarehouseDetails::new(Arc::clone(session.backend()));
    details.load(&session).await.expect("admin load");
    assert_eq!(details.warehouses.items().len(), 2);

    let totals = details.consolidated();
    let summary: Vec<(&str, i64, usize)> = totals
        .iter()
        .map(|t| (t.product.name.as_str(), t.total, t.locations))
        .collect();
    assert_eq!(summary, vec![("Nut", 12, 1), ("Bolt", 9, 2), ("Gear", 0, 0)]);
    assert!((totals[1].value() - 22.5).abs() < 1e-9);
    assert_eq!(totals[2].unit_price(), 4.0);
    assert!((details.total_value() - 28.5).abs() < 1e-9);

    let by_value = details.consolidated_sorted(&SortSpec::descending("value"));
    let names: Vec<&str> = by_value.iter().map(|t| t.product.name.as_str()).collect();
    assert_eq!(names, vec!["Bolt", "Nut", "Gear"]);

    let export = details.export();
    let date = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");
    assert_eq!(export.file_name(date), "warehouse_inventory_2026-10-17.csv");
    assert_eq!(export.rows[2], vec!["Nut", "North", "12", "0.5", "6"]);
}
