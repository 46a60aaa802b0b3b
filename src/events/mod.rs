use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted by the engine after a transaction commits. Delivery is
/// best-effort; a dropped event never fails the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Reorder events
    ReorderCreated {
        order_id: Uuid,
        inventory_id: Uuid,
        quantity: i32,
        demand: String,
    },

    // Order lifecycle events
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),
    QualityCheckRecorded {
        order_id: Uuid,
        status: String,
    },

    // Settlement events
    PaymentProcessed {
        order_id: Uuid,
        payment_ref: String,
    },
    InventoryDeducted {
        inventory_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consume events off the channel and log them. Runs for the lifetime
/// of the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ReorderCreated {
                order_id,
                inventory_id,
                quantity,
                demand,
            } => {
                info!(
                    order_id = %order_id,
                    inventory_id = %inventory_id,
                    quantity,
                    demand = %demand,
                    "reorder order created"
                );
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "order status changed"
                );
            }
            Event::OrderCancelled(order_id) => {
                info!(order_id = %order_id, "order cancelled");
            }
            Event::QualityCheckRecorded { order_id, status } => {
                info!(order_id = %order_id, status = %status, "quality check recorded");
            }
            Event::PaymentProcessed {
                order_id,
                payment_ref,
            } => {
                info!(order_id = %order_id, payment_ref = %payment_ref, "payment processed");
            }
            Event::InventoryDeducted {
                inventory_id,
                product_id,
                quantity,
            } => {
                info!(
                    inventory_id = %inventory_id,
                    product_id = %product_id,
                    quantity,
                    "inventory deducted"
                );
            }
        }
    }
}
