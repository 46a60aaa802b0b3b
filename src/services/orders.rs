//! Order lifecycle transitions: price review, quality check, delivery
//! confirmation, and cancellation.
//!
//! Every transition runs in one transaction covering the status write
//! and exactly one audit-trail entry; a failure anywhere rolls back both.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{order, order_item, order_status_history, quality_check},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{DeliveryStatus, NegotiationStatus, OrderStatus, QcStatus},
};

/// Outcome of a manager's review of the proposed negotiation price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDecision {
    Approve,
    Negotiate,
}

impl PriceDecision {
    /// Anything other than an explicit approval keeps the order in
    /// negotiation.
    pub fn from_request(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("approve") || trimmed.eq_ignore_ascii_case("approved") {
            Self::Approve
        } else {
            Self::Negotiate
        }
    }
}

#[derive(Clone)]
pub struct OrderLifecycleService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderLifecycleService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Apply a price review decision: approval moves the order to
    /// PRICE_APPROVED and approves every line; anything else moves it
    /// to PRICE_NEGOTIATING with the lines marked accordingly.
    #[instrument(skip(self, notes), fields(order_id = %order_id))]
    pub async fn review_price_proposal(
        &self,
        order_id: Uuid,
        decision: PriceDecision,
        notes: Option<String>,
        acting_user: &str,
    ) -> Result<order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = load_order(&txn, order_id).await?;
        let current = parse_status(&existing.status)?;
        if current.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot review price on a {} order",
                current
            )));
        }

        let (new_status, negotiation) = match decision {
            PriceDecision::Approve => (OrderStatus::PriceApproved, NegotiationStatus::Approved),
            PriceDecision::Negotiate => {
                (OrderStatus::PriceNegotiating, NegotiationStatus::Negotiating)
            }
        };

        let old_status = existing.status.clone();
        let now = Utc::now();
        let version = existing.version;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        order_item::Entity::update_many()
            .col_expr(
                order_item::Column::NegotiationStatus,
                Expr::value(negotiation.to_string()),
            )
            .col_expr(order_item::Column::UpdatedAt, Expr::value(now))
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;

        append_history(&txn, order_id, &new_status.to_string(), acting_user, notes).await?;

        txn.commit().await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Price decision applied"
        );
        self.notify_status_change(order_id, old_status, new_status.to_string())
            .await;

        Ok(updated)
    }

    /// Record a quality check. A rejected check is terminal for the
    /// order; an approved check leaves the status untouched (delivery
    /// confirmation owns the terminal transition) and only audits the
    /// inspection against the current status.
    #[instrument(skip(self, comments, parameters), fields(order_id = %order_id, qc_status = %qc_status))]
    pub async fn quality_check(
        &self,
        order_id: Uuid,
        qc_status: QcStatus,
        rejection_reason: Option<String>,
        comments: Option<String>,
        parameters: Option<serde_json::Value>,
        acting_user: &str,
    ) -> Result<quality_check::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = load_order(&txn, order_id).await?;
        let current = parse_status(&existing.status)?;
        if current.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot quality-check a {} order",
                current
            )));
        }

        let now = Utc::now();
        let record = quality_check::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            checked_by: Set(acting_user.to_string()),
            status: Set(qc_status.to_string()),
            comments: Set(comments.clone()),
            parameters: Set(parameters),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut status_change = None;
        match qc_status {
            QcStatus::Rejected => {
                let reason =
                    rejection_reason.unwrap_or_else(|| "Quality check failed".to_string());
                let old_status = existing.status.clone();
                let version = existing.version;

                let mut active: order::ActiveModel = existing.into();
                active.status = Set(OrderStatus::Rejected.to_string());
                active.rejection_reason = Set(Some(reason.clone()));
                active.updated_at = Set(Some(now));
                active.version = Set(version + 1);
                active.update(&txn).await?;

                append_history(
                    &txn,
                    order_id,
                    &OrderStatus::Rejected.to_string(),
                    acting_user,
                    Some(comments.unwrap_or(reason)),
                )
                .await?;
                status_change = Some((old_status, OrderStatus::Rejected.to_string()));
            }
            QcStatus::Approved => {
                let note = match comments {
                    Some(c) => format!("Quality check approved: {}", c),
                    None => "Quality check approved".to_string(),
                };
                append_history(&txn, order_id, &existing.status, acting_user, Some(note))
                    .await?;
            }
        }

        txn.commit().await?;

        info!(order_id = %order_id, qc_status = %qc_status, "Quality check recorded");
        if let Some(sender) = &self.event_sender {
            let event = Event::QualityCheckRecorded {
                order_id,
                status: qc_status.to_string(),
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, order_id = %order_id, "Failed to send quality check event");
            }
        }
        if let Some((old, new)) = status_change {
            self.notify_status_change(order_id, old, new).await;
        }

        Ok(record)
    }

    /// Confirm or reject delivery. Either way the order reaches a
    /// terminal state.
    #[instrument(skip(self), fields(order_id = %order_id, delivery_status = %delivery_status))]
    pub async fn mark_delivered(
        &self,
        order_id: Uuid,
        delivery_status: DeliveryStatus,
        rejection_reason: Option<String>,
        acting_user: &str,
    ) -> Result<order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = load_order(&txn, order_id).await?;
        let current = parse_status(&existing.status)?;
        if current.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot confirm delivery on a {} order",
                current
            )));
        }

        let old_status = existing.status.clone();
        let version = existing.version;
        let now = Utc::now();
        let mut active: order::ActiveModel = existing.into();

        let (new_status, comment) = match delivery_status {
            DeliveryStatus::Delivered => {
                active.actual_delivery_date = Set(Some(now));
                (OrderStatus::Delivered, "Order delivered".to_string())
            }
            DeliveryStatus::Rejected => {
                let reason =
                    rejection_reason.unwrap_or_else(|| "Delivery rejected".to_string());
                active.rejection_reason = Set(Some(reason.clone()));
                (OrderStatus::Rejected, reason)
            }
        };

        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        append_history(
            &txn,
            order_id,
            &new_status.to_string(),
            acting_user,
            Some(comment),
        )
        .await?;

        txn.commit().await?;

        info!(order_id = %order_id, new_status = %new_status, "Delivery confirmation applied");
        self.notify_status_change(order_id, old_status, new_status.to_string())
            .await;

        Ok(updated)
    }

    /// Cancel an order. Cancelling an already-cancelled order is a
    /// conflict.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        acting_user: &str,
    ) -> Result<order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = load_order(&txn, order_id).await?;
        let current = parse_status(&existing.status)?;
        if current == OrderStatus::Cancelled {
            return Err(ServiceError::Conflict(format!(
                "Order {} is already cancelled",
                order_id
            )));
        }

        let old_status = existing.status.clone();
        let version = existing.version;
        let now = Utc::now();

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(OrderStatus::Cancelled.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        append_history(
            &txn,
            order_id,
            &OrderStatus::Cancelled.to_string(),
            acting_user,
            None,
        )
        .await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order cancelled");
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
        }
        self.notify_status_change(order_id, old_status, OrderStatus::Cancelled.to_string())
            .await;

        Ok(updated)
    }

    /// Order with its line items and full audit trail.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_with_details(
        &self,
        order_id: Uuid,
    ) -> Result<
        (
            order::Model,
            Vec<order_item::Model>,
            Vec<order_status_history::Model>,
        ),
        ServiceError,
    > {
        let db = &*self.db;

        let order_row = load_order(db, order_id).await?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        let history = order_status_history::Entity::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .all(db)
            .await?;

        Ok((order_row, items, history))
    }

    async fn notify_status_change(&self, order_id: Uuid, old_status: String, new_status: String) {
        if let Some(sender) = &self.event_sender {
            let event = Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order status changed event");
            }
        }
    }
}

async fn load_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<order::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    raw.parse().map_err(|_| {
        ServiceError::InvalidStatus(format!("Order has unrecognized status '{}'", raw))
    })
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: &str,
    changed_by: &str,
    comments: Option<String>,
) -> Result<(), ServiceError> {
    order_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.to_string()),
        changed_by: Set(changed_by.to_string()),
        comments: Set(comments),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
