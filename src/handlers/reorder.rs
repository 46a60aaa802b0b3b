use axum::{extract::State, response::IntoResponse, routing::post, Router};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{map_service_error, success_response};
use super::ActingUser;
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::reorder::{ReorderItemStatus, ReorderOutcome},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderScanResponse {
    pub success: bool,
    pub message: String,
    pub details: Vec<ReorderDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderDetail {
    pub inventory_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub demand_type: String,
    /// Priority hint for created orders, or the per-item failure reason.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
}

impl From<ReorderOutcome> for ReorderDetail {
    fn from(outcome: ReorderOutcome) -> Self {
        let (status, order_id) = match outcome.status {
            ReorderItemStatus::Created {
                order_id,
                priority_hint,
            } => (priority_hint.to_string(), Some(order_id)),
            ReorderItemStatus::NoSupplierFound => ("NO_SUPPLIER_FOUND".to_string(), None),
            ReorderItemStatus::Failed(reason) => (format!("FAILED: {}", reason), None),
        };
        Self {
            inventory_id: outcome.inventory_id,
            product_id: outcome.product_id,
            quantity: outcome.quantity,
            demand_type: outcome.demand.to_string(),
            status,
            order_id,
        }
    }
}

/// Scan inventory and create supplier reorder orders for every item
/// below its demand-scaled limits.
#[utoipa::path(
    post,
    path = "/api/v1/reorder",
    responses(
        (status = 200, description = "Scan executed; details enumerate per-item outcomes", body = ReorderScanResponse),
        (status = 500, description = "Scan could not run", body = crate::errors::ErrorResponse)
    ),
    tag = "Reorder"
)]
pub async fn trigger_reorder(
    State(state): State<AppState>,
    user: ActingUser,
) -> Result<impl IntoResponse, ApiError> {
    let outcomes = state
        .services
        .reorder
        .scan(user.as_str())
        .await
        .map_err(map_service_error)?;

    let created = outcomes
        .iter()
        .filter(|o| matches!(o.status, ReorderItemStatus::Created { .. }))
        .count();
    let skipped = outcomes.len() - created;

    let message = if outcomes.is_empty() {
        "No items required reordering".to_string()
    } else {
        format!("{} reorder orders created, {} items not ordered", created, skipped)
    };

    info!(created, skipped, "Reorder scan handled");

    Ok(success_response(ReorderScanResponse {
        success: true,
        message,
        details: outcomes.into_iter().map(ReorderDetail::from).collect(),
    }))
}

/// Creates the router for reorder endpoints
pub fn reorder_routes() -> Router<AppState> {
    Router::new().route("/reorder", post(trigger_reorder))
}
