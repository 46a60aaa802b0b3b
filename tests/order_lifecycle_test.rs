mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;
use restock_api::models::OrderStatus;

#[tokio::test]
async fn approving_price_updates_order_lines_and_history() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::PriceProposed)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/pricedecision/{}", order_id),
            Some(json!({"decision": "APPROVE", "negotiationNotes": "price ok"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("PRICE_APPROVED"));

    let (_, detail) = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(detail["items"][0]["negotiationStatus"], json!("APPROVED"));

    let history = detail["history"].as_array().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], json!("PRICE_APPROVED"));
    assert_eq!(history[0]["changedBy"], json!("test-user"));
    assert_eq!(history[0]["comments"], json!("price ok"));
}

#[tokio::test]
async fn non_approval_moves_order_into_negotiation() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::PriceProposed)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/pricedecision/{}", order_id),
            Some(json!({"decision": "COUNTER", "negotiationNotes": "too high"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("PRICE_NEGOTIATING"));

    let (_, detail) = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(detail["items"][0]["negotiationStatus"], json!("NEGOTIATING"));
}

#[tokio::test]
async fn rejected_quality_check_terminates_the_order() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::InProduction)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/qc/{}", order_id),
            Some(json!({
                "qcStatus": "REJECTED",
                "rejectionReason": "Damaged packaging",
                "parameters": {"moisture": "14%"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qualityCheck"]["status"], json!("REJECTED"));
    assert_eq!(body["qualityCheck"]["checkedBy"], json!("test-user"));

    let (_, detail) = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(detail["order"]["status"], json!("REJECTED"));
    assert_eq!(detail["order"]["rejectionReason"], json!("Damaged packaging"));

    let history = detail["history"].as_array().expect("history");
    assert!(history.iter().any(|h| h["status"] == json!("REJECTED")));
}

#[tokio::test]
async fn approved_quality_check_leaves_status_untouched_but_audits() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::InProduction)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/qc/{}", order_id),
            Some(json!({"qcStatus": "APPROVED", "comments": "all parameters nominal"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qualityCheck"]["status"], json!("APPROVED"));

    let (_, detail) = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    // Status is unchanged; the audit entry records the check itself.
    assert_eq!(detail["order"]["status"], json!("IN_PRODUCTION"));

    let history = detail["history"].as_array().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], json!("IN_PRODUCTION"));
    let comment = history[0]["comments"].as_str().expect("comment");
    assert!(comment.contains("Quality check approved"));
}

#[tokio::test]
async fn delivery_confirmation_is_terminal() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::InProduction)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/deliveredConfirmation/{}", order_id),
            Some(json!({"deliveryStatus": "DELIVERED"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderDelivered"]["status"], json!("DELIVERED"));
    assert!(body["orderDelivered"]["actualDeliveryDate"].is_string());

    // Terminal: no further lifecycle transitions are accepted.
    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/qc/{}", order_id),
            Some(json!({"qcStatus": "APPROVED"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_delivery_records_the_reason() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::InProduction)
        .await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/deliveredConfirmation/{}", order_id),
            Some(json!({"deliveryStatus": "REJECTED", "rejectionReason": "Wrong batch"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderDelivered"]["status"], json!("REJECTED"));
    assert_eq!(body["orderDelivered"]["rejectionReason"], json!("Wrong batch"));
}

#[tokio::test]
async fn cancelling_twice_conflicts() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::ReorderRequested)
        .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cancel-order",
            Some(json!({"orderId": order_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], json!("CANCELLED"));

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cancel-order",
            Some(json!({"orderId": order_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/pricedecision/{}", uuid::Uuid::new_v4()),
            Some(json!({"decision": "APPROVE"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_transition_appends_exactly_one_history_entry() {
    let app = TestApp::new().await;
    let supplier_id = app.seed_supplier("Acme Traders").await;
    let product_id = app.seed_product("Beans", dec!(40), Some(supplier_id)).await;
    let order_id = app
        .seed_supplier_order(supplier_id, product_id, 30, dec!(40), OrderStatus::PriceProposed)
        .await;

    app.request(
        Method::PATCH,
        &format!("/api/v1/pricedecision/{}", order_id),
        Some(json!({"decision": "APPROVE"})),
    )
    .await;
    app.request(
        Method::PATCH,
        &format!("/api/v1/qc/{}", order_id),
        Some(json!({"qcStatus": "APPROVED"})),
    )
    .await;
    app.request(
        Method::PATCH,
        &format!("/api/v1/deliveredConfirmation/{}", order_id),
        Some(json!({"deliveryStatus": "DELIVERED"})),
    )
    .await;

    let (_, detail) = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let history = detail["history"].as_array().expect("history");
    assert_eq!(history.len(), 3);
}
