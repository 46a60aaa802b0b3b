pub mod common;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod reorder;

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    inventory::InventoryService, orders::OrderLifecycleService,
    payments::PaymentSettlementService, reorder::ReorderService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub reorder: Arc<ReorderService>,
    pub lifecycle: Arc<OrderLifecycleService>,
    pub settlement: Arc<PaymentSettlementService>,
    pub inventory: Arc<InventoryService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        payment_secret: String,
    ) -> Self {
        Self {
            reorder: Arc::new(ReorderService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            lifecycle: Arc::new(OrderLifecycleService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            settlement: Arc::new(PaymentSettlementService::new(
                db_pool.clone(),
                payment_secret,
                Some(event_sender),
            )),
            inventory: Arc::new(InventoryService::new(db_pool)),
        }
    }
}

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity resolved by the upstream auth layer and forwarded in
/// the `x-user-id` header. Absent or unreadable means `"unknown"` for
/// audit fields.
#[derive(Debug, Clone)]
pub struct ActingUser(pub String);

impl ActingUser {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self(user))
    }
}
