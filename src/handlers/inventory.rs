use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{map_service_error, success_response, PaginationParams};
use crate::{entities::inventory_item, errors::ApiError, handlers::AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub threshold: i32,
    pub reorder_level: i32,
    pub reorder_quantity: i32,
    pub safety_stock: i32,
    pub price: Decimal,
    pub demand_label: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<inventory_item::Model> for InventoryItemResponse {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            threshold: model.threshold,
            reorder_level: model.reorder_level,
            reorder_quantity: model.reorder_quantity,
            safety_stock: model.safety_stock,
            price: model.price,
            demand_label: model.demand_label,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListResponse {
    pub items: Vec<InventoryItemResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// List inventory items.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams),
    responses(
        (status = 200, description = "Inventory page", body = InventoryListResponse)
    ),
    tag = "Inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .inventory
        .list_inventory(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(InventoryListResponse {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page: params.page,
        per_page: params.per_page,
    }))
}

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new().route("/inventory", get(list_inventory))
}
