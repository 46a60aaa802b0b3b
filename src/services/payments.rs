//! Payment callback verification and settlement.
//!
//! A settlement marks the order paid and reconciles every line item
//! against inventory and the sales ledger in a single transaction. The
//! inventory decrement is guarded by a quantity floor so concurrent
//! settlements against the same row serialize at the storage layer;
//! the loser fails with `InsufficientStock` and the whole settlement
//! rolls back.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use sha2::Sha256;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{inventory_item, order, order_item, order_status_history, product, sales_transaction},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, PaymentStatus, TransactionType},
};

type HmacSha256 = Hmac<Sha256>;

/// Verified fields of a gateway payment callback.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub gateway_order_ref: String,
    pub payment_ref: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct PaymentSettlementService {
    db: Arc<DbPool>,
    payment_secret: String,
    event_sender: Option<Arc<EventSender>>,
}

impl PaymentSettlementService {
    pub fn new(
        db: Arc<DbPool>,
        payment_secret: String,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            payment_secret,
            event_sender,
        }
    }

    /// Server-side signature over `orderRef|paymentRef`, hex encoded.
    pub fn compute_signature(secret: &str, order_ref: &str, payment_ref: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take a key of any size");
        mac.update(format!("{}|{}", order_ref, payment_ref).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify_signature(&self, request: &SettlementRequest) -> Result<(), ServiceError> {
        let expected = Self::compute_signature(
            &self.payment_secret,
            &request.gateway_order_ref,
            &request.payment_ref,
        );
        if constant_time_eq(&expected, &request.signature) {
            Ok(())
        } else {
            warn!(
                gateway_order_ref = %request.gateway_order_ref,
                "Payment signature verification failed"
            );
            Err(ServiceError::InvalidSignature)
        }
    }

    /// Settle a verified payment callback against the matching order.
    #[instrument(skip(self, request), fields(gateway_order_ref = %request.gateway_order_ref))]
    pub async fn process_payment(
        &self,
        request: SettlementRequest,
        acting_user: &str,
    ) -> Result<order::Model, ServiceError> {
        if request.gateway_order_ref.trim().is_empty()
            || request.payment_ref.trim().is_empty()
            || request.signature.trim().is_empty()
        {
            return Err(ServiceError::ValidationError(
                "gatewayOrderRef, paymentRef and signature are required".to_string(),
            ));
        }

        self.verify_signature(&request)?;

        let db = &*self.db;
        let txn = db.begin().await?;

        // The callback reference is either the gateway's order id or ours.
        let mut condition = Condition::any()
            .add(order::Column::GatewayOrderRef.eq(request.gateway_order_ref.clone()));
        if let Ok(id) = Uuid::parse_str(request.gateway_order_ref.trim()) {
            condition = condition.add(order::Column::Id.eq(id));
        }

        let existing = order::Entity::find()
            .filter(condition)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Order matching reference {} not found",
                    request.gateway_order_ref
                ))
            })?;

        if existing.payment_status.eq_ignore_ascii_case(&PaymentStatus::Paid.to_string()) {
            return Err(ServiceError::AlreadyProcessed(existing.id));
        }

        let order_id = existing.id;
        let old_status = existing.status.clone();
        let version = existing.version;

        let lines = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        let now = Utc::now();
        let mut active: order::ActiveModel = existing.into();
        active.payment_status = Set(PaymentStatus::Paid.to_string());
        active.status = Set(OrderStatus::Completed.to_string());
        active.gateway_order_ref = Set(Some(request.gateway_order_ref.clone()));
        active.gateway_payment_ref = Set(Some(request.payment_ref.clone()));
        active.gateway_signature = Set(Some(request.signature.clone()));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(OrderStatus::Completed.to_string()),
            changed_by: Set(acting_user.to_string()),
            comments: Set(Some(format!(
                "Payment {} confirmed and settled",
                request.payment_ref
            ))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut deductions = Vec::with_capacity(lines.len());
        for line in &lines {
            let product_row = product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product {} not found for settlement",
                        line.product_id
                    ))
                })?;

            let inventory = inventory_item::Entity::find()
                .filter(inventory_item::Column::ProductId.eq(line.product_id))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Inventory record for product {} not found",
                        line.product_id
                    ))
                })?;

            // Ledger entry and decrement are one unit: a failure of
            // either rolls back the entire settlement.
            let total = product_row.price * Decimal::from(line.quantity);
            sales_transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                total: Set(total),
                cashier_id: Set(acting_user.to_string()),
                transaction_type: Set(TransactionType::Sale.to_string()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            // Conditional decrement: only applies while enough stock
            // remains, and serializes concurrent settlements on the row.
            let result = inventory_item::Entity::update_many()
                .col_expr(
                    inventory_item::Column::Quantity,
                    Expr::col(inventory_item::Column::Quantity).sub(line.quantity),
                )
                .col_expr(inventory_item::Column::UpdatedAt, Expr::value(now))
                .filter(inventory_item::Column::Id.eq(inventory.id))
                .filter(inventory_item::Column::Quantity.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                warn!(
                    order_id = %order_id,
                    inventory_id = %inventory.id,
                    requested = line.quantity,
                    "Insufficient stock during settlement; rolling back"
                );
                return Err(ServiceError::InsufficientStock(format!(
                    "Inventory for product {} cannot cover quantity {}",
                    line.product_id, line.quantity
                )));
            }

            deductions.push((inventory.id, line.product_id, line.quantity));
        }

        txn.commit().await?;

        info!(
            order_id = %order_id,
            payment_ref = %request.payment_ref,
            lines = deductions.len(),
            old_status = %old_status,
            "Payment settled"
        );

        if let Some(sender) = &self.event_sender {
            let event = Event::PaymentProcessed {
                order_id,
                payment_ref: request.payment_ref.clone(),
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, order_id = %order_id, "Failed to send payment processed event");
            }
            for (inventory_id, product_id, quantity) in deductions {
                let event = Event::InventoryDeducted {
                    inventory_id,
                    product_id,
                    quantity,
                };
                if let Err(e) = sender.send(event).await {
                    warn!(error = %e, inventory_id = %inventory_id, "Failed to send inventory deducted event");
                }
            }
        }

        Ok(updated)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
