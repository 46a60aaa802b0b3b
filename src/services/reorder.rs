//! Demand-driven reorder decisions and the batch scan that turns
//! triggered items into supplier-bound orders.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{inventory_item, order, order_item, order_status_history, product},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{DemandLabel, NegotiationStatus, OrderStatus, OrderType, PaymentStatus},
    services::pricing,
};

/// Demand-scaled safety stock for an item's base safety stock.
pub fn safety_stock(base_safety_stock: i32, demand: DemandLabel) -> Decimal {
    let multiplier = match demand {
        DemandLabel::Low => dec!(1),
        DemandLabel::Medium => dec!(1.5),
        DemandLabel::High => dec!(2),
    };
    Decimal::from(base_safety_stock) * multiplier
}

/// Demand-scaled reorder quantity, with per-level floors so a reorder
/// is never created for a token amount.
pub fn reorder_quantity(base_reorder_quantity: i32, demand: DemandLabel) -> i32 {
    match demand {
        DemandLabel::Low => base_reorder_quantity.max(10),
        DemandLabel::Medium => scale_quantity(base_reorder_quantity, dec!(1.5)).max(20),
        DemandLabel::High => base_reorder_quantity.saturating_mul(2).max(50),
    }
}

fn scale_quantity(base: i32, factor: Decimal) -> i32 {
    (Decimal::from(base) * factor)
        .ceil()
        .to_i32()
        .unwrap_or(i32::MAX)
}

/// Whether an item needs replenishment. Any single breach triggers:
/// reorder level, raw threshold, or the demand-scaled safety stock.
pub fn should_reorder(item: &inventory_item::Model, demand: DemandLabel) -> bool {
    item.quantity <= item.reorder_level
        || item.quantity <= item.threshold
        || Decimal::from(item.quantity) <= safety_stock(item.safety_stock, demand)
}

/// Advisory urgency hint for UI triage. This is NOT the order status;
/// every created reorder starts in `ReorderRequested` regardless of demand.
pub fn priority_hint(demand: DemandLabel) -> OrderStatus {
    match demand {
        DemandLabel::Low => OrderStatus::ReorderRequested,
        DemandLabel::Medium => OrderStatus::PriceProposed,
        DemandLabel::High => OrderStatus::InProduction,
    }
}

/// Per-item result of a reorder scan.
#[derive(Debug, Clone)]
pub struct ReorderOutcome {
    pub inventory_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub demand: DemandLabel,
    pub status: ReorderItemStatus,
}

#[derive(Debug, Clone)]
pub enum ReorderItemStatus {
    Created {
        order_id: Uuid,
        priority_hint: OrderStatus,
    },
    NoSupplierFound,
    Failed(String),
}

enum CreateResult {
    Created(Uuid),
    NoSupplier,
}

/// Scans inventory and creates supplier reorder orders for items whose
/// stock has fallen below their demand-scaled limits.
#[derive(Clone)]
pub struct ReorderService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ReorderService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Run a full inventory scan. Items are processed independently:
    /// one item's failure never aborts the rest of the batch.
    #[instrument(skip(self), fields(triggered_by = %triggered_by))]
    pub async fn scan(&self, triggered_by: &str) -> Result<Vec<ReorderOutcome>, ServiceError> {
        let db = &*self.db;

        let items = inventory_item::Entity::find().all(db).await?;
        let mut outcomes = Vec::new();

        for item in items {
            let demand = DemandLabel::resolve(item.demand_label.as_deref());
            if !should_reorder(&item, demand) {
                continue;
            }

            let quantity = reorder_quantity(item.reorder_quantity, demand);
            let status = match self
                .create_reorder_order(&item, demand, quantity, triggered_by)
                .await
            {
                Ok(CreateResult::Created(order_id)) => {
                    if let Some(sender) = &self.event_sender {
                        let event = Event::ReorderCreated {
                            order_id,
                            inventory_id: item.id,
                            quantity,
                            demand: demand.to_string(),
                        };
                        if let Err(e) = sender.send(event).await {
                            warn!(error = %e, order_id = %order_id, "Failed to send reorder created event");
                        }
                    }
                    ReorderItemStatus::Created {
                        order_id,
                        priority_hint: priority_hint(demand),
                    }
                }
                Ok(CreateResult::NoSupplier) => {
                    warn!(inventory_id = %item.id, product_id = %item.product_id, "No supplier for triggered item");
                    ReorderItemStatus::NoSupplierFound
                }
                Err(e) => {
                    // Surfaced in this item's outcome; siblings continue.
                    error!(error = %e, inventory_id = %item.id, "Failed to create reorder order");
                    ReorderItemStatus::Failed(e.to_string())
                }
            };

            outcomes.push(ReorderOutcome {
                inventory_id: item.id,
                product_id: item.product_id,
                quantity,
                demand,
                status,
            });
        }

        info!(triggered = outcomes.len(), "Reorder scan complete");
        Ok(outcomes)
    }

    /// Create one supplier order for a triggered item: order row, its
    /// single line item, and the initial audit entry in one transaction.
    async fn create_reorder_order(
        &self,
        item: &inventory_item::Model,
        demand: DemandLabel,
        quantity: i32,
        triggered_by: &str,
    ) -> Result<CreateResult, ServiceError> {
        let db = &*self.db;

        let product = product::Entity::find_by_id(item.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", item.product_id))
            })?;

        let Some(supplier_id) = product.supplier_id else {
            return Ok(CreateResult::NoSupplier);
        };

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let total_amount = item.price * Decimal::from(quantity);

        let txn = db.begin().await?;

        order::ActiveModel {
            id: Set(order_id),
            order_number: Set(reorder_number(order_id)),
            order_type: Set(OrderType::System.to_string()),
            status: Set(OrderStatus::ReorderRequested.to_string()),
            supplier_id: Set(Some(supplier_id)),
            customer_id: Set(None),
            total_amount: Set(total_amount),
            payment_status: Set(PaymentStatus::Pending.to_string()),
            rejection_reason: Set(None),
            gateway_order_ref: Set(None),
            gateway_payment_ref: Set(None),
            gateway_signature: Set(None),
            notes: Set(Some(format!(
                "Automatic reorder for inventory item {} ({} demand)",
                item.id, demand
            ))),
            actual_delivery_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            quantity: Set(quantity),
            requested_price: Set(item.price),
            proposed_price: Set(Some(pricing::proposed_price(item.price, demand))),
            negotiation_status: Set(NegotiationStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(OrderStatus::ReorderRequested.to_string()),
            changed_by: Set(triggered_by.to_string()),
            comments: Set(Some("Automatic reorder created by inventory scan".to_string())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            order_id = %order_id,
            inventory_id = %item.id,
            supplier_id = %supplier_id,
            quantity,
            "Reorder order created"
        );

        Ok(CreateResult::Created(order_id))
    }

}

fn reorder_number(order_id: Uuid) -> String {
    let hex = order_id.simple().to_string();
    format!("RO-{}", hex[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_item(
        quantity: i32,
        threshold: i32,
        reorder_level: i32,
        base_safety_stock: i32,
        base_reorder_quantity: i32,
    ) -> inventory_item::Model {
        inventory_item::Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            threshold,
            reorder_level,
            reorder_quantity: base_reorder_quantity,
            safety_stock: base_safety_stock,
            price: dec!(40),
            demand_label: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn safety_stock_scales_with_demand() {
        assert_eq!(safety_stock(4, DemandLabel::Low), dec!(4));
        assert_eq!(safety_stock(4, DemandLabel::Medium), dec!(6));
        assert_eq!(safety_stock(4, DemandLabel::High), dec!(8));
    }

    #[test]
    fn reorder_quantity_applies_floors() {
        assert_eq!(reorder_quantity(1, DemandLabel::Low), 10);
        assert_eq!(reorder_quantity(1, DemandLabel::Medium), 20);
        assert_eq!(reorder_quantity(1, DemandLabel::High), 50);
    }

    #[test]
    fn reorder_quantity_scales_large_bases() {
        assert_eq!(reorder_quantity(40, DemandLabel::Low), 40);
        assert_eq!(reorder_quantity(40, DemandLabel::Medium), 60);
        assert_eq!(reorder_quantity(40, DemandLabel::High), 80);
    }

    #[test]
    fn medium_demand_scenario_from_ops_playbook() {
        // quantity 5, threshold 10, reorder level 8, safety stock 3, base qty 20
        let item = make_item(5, 10, 8, 3, 20);
        assert!(should_reorder(&item, DemandLabel::Medium));
        assert_eq!(reorder_quantity(item.reorder_quantity, DemandLabel::Medium), 30);
    }

    #[test]
    fn any_single_breach_triggers() {
        // Only the reorder level is breached.
        let item = make_item(8, 2, 8, 1, 20);
        assert!(should_reorder(&item, DemandLabel::Low));

        // Only the threshold is breached.
        let item = make_item(9, 10, 2, 1, 20);
        assert!(should_reorder(&item, DemandLabel::Low));

        // Only the scaled safety stock is breached (6 <= 2 * 4).
        let item = make_item(6, 2, 2, 4, 20);
        assert!(should_reorder(&item, DemandLabel::High));
        assert!(!should_reorder(&item, DemandLabel::Low));
    }

    #[test]
    fn healthy_stock_does_not_trigger() {
        let item = make_item(100, 10, 8, 3, 20);
        assert!(!should_reorder(&item, DemandLabel::High));
    }

    #[test]
    fn priority_hint_tracks_demand() {
        assert_eq!(priority_hint(DemandLabel::Low), OrderStatus::ReorderRequested);
        assert_eq!(priority_hint(DemandLabel::Medium), OrderStatus::PriceProposed);
        assert_eq!(priority_hint(DemandLabel::High), OrderStatus::InProduction);
    }

    proptest! {
        #[test]
        fn trigger_is_exactly_the_disjunction(
            quantity in 0i32..500,
            threshold in 0i32..500,
            reorder_level in 0i32..500,
            base_safety in 0i32..500,
        ) {
            for demand in [DemandLabel::Low, DemandLabel::Medium, DemandLabel::High] {
                let item = make_item(quantity, threshold, reorder_level, base_safety, 20);
                let expected = quantity <= reorder_level
                    || quantity <= threshold
                    || Decimal::from(quantity) <= safety_stock(base_safety, demand);
                prop_assert_eq!(should_reorder(&item, demand), expected);
            }
        }

        #[test]
        fn quantity_is_non_decreasing_in_demand(base in 0i32..100_000) {
            let low = reorder_quantity(base, DemandLabel::Low);
            let medium = reorder_quantity(base, DemandLabel::Medium);
            let high = reorder_quantity(base, DemandLabel::High);
            prop_assert!(low <= medium);
            prop_assert!(medium <= high);
        }
    }
}
