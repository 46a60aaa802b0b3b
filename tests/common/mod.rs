#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Schema, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use restock_api::{
    config::AppConfig,
    db,
    entities::{
        inventory_item, order, order_item, order_status_history, product, quality_check,
        sales_transaction, supplier,
    },
    events::{self, EventSender},
    handlers::AppServices,
    models::{NegotiationStatus, OrderStatus, OrderType, PaymentStatus},
    services::payments::PaymentSettlementService,
    AppState,
};

pub const TEST_PAYMENT_SECRET: &str = "test_payment_secret_for_integration_runs_only";

/// Create every owned table in the test SQLite database straight from the
/// entity definitions. This mirrors what `db::bootstrap_schema` does for
/// PostgreSQL in production, but lets sea-orm pick SQLite-appropriate column
/// types (notably `real` for `Decimal`, which round-trips; the production
/// `NUMERIC` affinity coerces integer-valued decimals to INTEGER and breaks
/// decimal read-back on SQLite).
async fn create_schema(db: &sea_orm::DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    macro_rules! create_table {
        ($entity:expr) => {{
            let stmt = schema.create_table_from_entity($entity).if_not_exists().to_owned();
            db.execute(backend.build(&stmt))
                .await
                .expect("failed to create test table");
        }};
    }

    create_table!(supplier::Entity);
    create_table!(product::Entity);
    create_table!(inventory_item::Entity);
    create_table!(order::Entity);
    create_table!(order_item::Entity);
    create_table!(order_status_history::Entity);
    create_table!(quality_check::Entity);
    create_table!(sales_transaction::Entity);
}

/// Helper harness for spinning up an application state backed by a
/// SQLite database in a temporary directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = db_dir.path().join("restock_test.db");

        let cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_PAYMENT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        // Provision the schema directly from the entity definitions rather than
        // the production `NUMERIC` DDL. sea-orm maps `Decimal` columns to SQLite
        // `real` affinity, which round-trips cleanly; SQLite's `NUMERIC` affinity
        // instead coerces integer-valued decimals to INTEGER storage and breaks
        // sea-orm's `f64`-based decimal read path on read-back.
        create_schema(&pool).await;

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            cfg.payment_secret.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", restock_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Issue a request as the default test user and decode the JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_as(method, uri, body, Some("test-user")).await
    }

    pub async fn request_as(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn seed_supplier(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        supplier::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            contact_email: Set(None),
            phone: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed supplier");
        id
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        supplier_id: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            sku: Set(format!("SKU-{}", &id.simple().to_string()[..8])),
            price: Set(price),
            supplier_id: Set(supplier_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product");
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn seed_inventory(
        &self,
        product_id: Uuid,
        quantity: i32,
        threshold: i32,
        reorder_level: i32,
        reorder_quantity: i32,
        safety_stock: i32,
        price: Decimal,
        demand_label: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        inventory_item::ActiveModel {
            id: Set(id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            threshold: Set(threshold),
            reorder_level: Set(reorder_level),
            reorder_quantity: Set(reorder_quantity),
            safety_stock: Set(safety_stock),
            price: Set(price),
            demand_label: Set(demand_label.map(|s| s.to_string())),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed inventory");
        id
    }

    /// Seed a pending customer order with one line per (product, quantity, price).
    pub async fn seed_customer_order(
        &self,
        lines: &[(Uuid, i32, Decimal)],
        gateway_order_ref: Option<&str>,
    ) -> Uuid {
        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let total: Decimal = lines
            .iter()
            .map(|(_, qty, price)| *price * Decimal::from(*qty))
            .sum();

        order::ActiveModel {
            id: Set(order_id),
            order_number: Set(format!("CO-{}", &order_id.simple().to_string()[..8])),
            order_type: Set(OrderType::Customer.to_string()),
            status: Set(OrderStatus::Pending.to_string()),
            supplier_id: Set(None),
            customer_id: Set(Some(Uuid::new_v4())),
            total_amount: Set(total),
            payment_status: Set(PaymentStatus::Pending.to_string()),
            rejection_reason: Set(None),
            gateway_order_ref: Set(gateway_order_ref.map(|s| s.to_string())),
            gateway_payment_ref: Set(None),
            gateway_signature: Set(None),
            notes: Set(None),
            actual_delivery_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed order");

        for (product_id, quantity, price) in lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(*product_id),
                quantity: Set(*quantity),
                requested_price: Set(*price),
                proposed_price: Set(None),
                negotiation_status: Set(NegotiationStatus::Pending.to_string()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to seed order line");
        }

        order_id
    }

    /// Seed a supplier-bound order in a given lifecycle state.
    pub async fn seed_supplier_order(
        &self,
        supplier_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
        status: OrderStatus,
    ) -> Uuid {
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        order::ActiveModel {
            id: Set(order_id),
            order_number: Set(format!("RO-{}", &order_id.simple().to_string()[..8])),
            order_type: Set(OrderType::System.to_string()),
            status: Set(status.to_string()),
            supplier_id: Set(Some(supplier_id)),
            customer_id: Set(None),
            total_amount: Set(price * Decimal::from(quantity)),
            payment_status: Set(PaymentStatus::Pending.to_string()),
            rejection_reason: Set(None),
            gateway_order_ref: Set(None),
            gateway_payment_ref: Set(None),
            gateway_signature: Set(None),
            notes: Set(None),
            actual_delivery_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed order");

        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            requested_price: Set(price),
            proposed_price: Set(Some(price)),
            negotiation_status: Set(NegotiationStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed order line");

        order_id
    }
}

/// Signature a well-behaved gateway would attach to its callback.
pub fn settlement_signature(order_ref: &str, payment_ref: &str) -> String {
    PaymentSettlementService::compute_signature(TEST_PAYMENT_SECRET, order_ref, payment_ref)
}

/// Decode a JSON field that serializes a decimal (string or number).
pub fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("invalid decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("invalid decimal number"),
        other => panic!("expected decimal field, got {:?}", other),
    }
}
