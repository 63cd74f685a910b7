use serde_json::json;

use super::*;

#[test]
fn user_decoding_ignores_password_and_normalizes_role() {
    let user: User = serde_json::from_value(json!({
        "id": 3,
        "name": "Mia",
        "email": "mia@example.com",
        "phoneNumber": "555-0101",
        "role": "manager",
        "passwordHash": "secret"
    }))
    .expect("user");

    assert_eq!(user.role, Some(Role::Manager));
    let round = serde_json::to_value(&user).expect("serialize");
    assert!(round.get("passwordHash").is_none());
    assert_eq!(round["role"], "MANAGER");
}

#[test]
fn inventory_numbers_decode_leniently() {
    let records: Vec<InventoryRecord> = serde_json::from_value(json!([
        { "id": 1, "stockLevel": 5, "product": { "id": 9, "name": "Bolt", "price": "2.50" } },
        { "id": 2, "stockLevel": "7" },
        { "id": 3, "stockLevel": null, "product": { "id": 9, "price": "n/a" } },
        { "id": 4, "stockLevel": { "nested": true } }
    ]))
    .expect("records");

    assert_eq!(records[0].stock_level, Some(5));
    assert_eq!(records[0].unit_price(), Some(2.5));
    assert_eq!(records[1].stock_level, Some(7));
    assert_eq!(records[2].stock_level, None);
    assert_eq!(records[2].unit_price(), None);
    assert_eq!(records[3].stock_level, None);
    assert_eq!(records[1].product_name(), "");
}

#[test]
fn history_timestamps_accept_local_and_offset_forms() {
    let entries: Vec<StockHistoryEntry> = serde_json::from_value(json!([
        { "id": 1, "adjustmentType": "ADD", "timestamp": "2024-03-01T09:15:00" },
        { "id": 2, "adjustmentType": "REMOVE", "timestamp": "2024-03-01T09:15:00.123456" },
        { "id": 3, "adjustmentType": "REMOVE", "timestamp": "2024-03-01T09:15:00Z" },
        { "id": 4, "adjustmentType": "ADD", "timestamp": [2024, 3, 1] }
    ]))
    .expect("history");

    assert!(entries[0].timestamp.is_some());
    assert!(entries[1].timestamp.is_some());
    assert_eq!(entries[2].timestamp, entries[0].timestamp);
    assert!(entries[3].timestamp.is_none());
}

#[test]
fn null_or_missing_adjustment_type_does_not_fail_the_list() {
    let entries: Vec<StockHistoryEntry> = serde_json::from_value(json!([
        { "id": 1, "adjustmentType": "ADD" },
        { "id": 2, "adjustmentType": null },
        { "id": 3 },
        { "id": 4, "adjustmentType": "remove" },
        { "id": 5, "adjustmentType": 7 }
    ]))
    .expect("history with gaps");

    let kinds: Vec<_> = entries.iter().map(|e| e.adjustment_type).collect();
    assert_eq!(
        kinds,
        vec![
            StockAdjustmentType::Add,
            StockAdjustmentType::Unknown,
            StockAdjustmentType::Unknown,
            StockAdjustmentType::Remove,
            StockAdjustmentType::Unknown,
        ]
    );
}

#[test]
fn request_debug_output_redacts_passwords() {
    let login = LoginRequest {
        email: "a@b.com".into(),
        password: "hunter22".into(),
    };
    assert!(!format!("{login:?}").contains("hunter22"));

    let update = UserUpdate {
        name: "A".into(),
        email: "a@b.com".into(),
        phone_number: None,
        password_hash: Some("hunter22".into()),
    };
    assert!(!format!("{update:?}").contains("hunter22"));
    let body = serde_json::to_value(&update).expect("serialize");
    assert_eq!(body["passwordHash"], "hunter22");
}

#[test]
fn stock_adjustment_request_uses_camel_case() {
    let body = serde_json::to_value(StockAdjustmentRequest {
        product_id: ProductId(1),
        warehouse_id: WarehouseId(2),
        quantity: 3,
        performed_by_email: "e@x.com".into(),
    })
    .expect("serialize");
    assert_eq!(
        body,
        json!({ "productId": 1, "warehouseId": 2, "quantity": 3, "performedByEmail": "e@x.com" })
    );
}
