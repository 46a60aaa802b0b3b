use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{map_service_error, success_response, validate_input};
use super::ActingUser;
use crate::{
    entities::{order, order_item, order_status_history, quality_check},
    errors::ApiError,
    handlers::AppState,
    models::{DeliveryStatus, QcStatus},
    services::orders::PriceDecision,
};

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceDecisionRequest {
    #[validate(length(min = 1, message = "Decision is required"))]
    pub decision: String,
    pub negotiation_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckRequest {
    #[validate(length(min = 1, message = "QC status is required"))]
    pub qc_status: String,
    pub rejection_reason: Option<String>,
    pub comments: Option<String>,
    /// Free-form inspection data recorded with the check.
    #[schema(value_type = Object)]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredConfirmationRequest {
    #[validate(length(min = 1, message = "Delivery status is required"))]
    pub delivery_status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub order_type: String,
    pub status: String,
    pub supplier_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub rejection_reason: Option<String>,
    pub gateway_order_ref: Option<String>,
    pub gateway_payment_ref: Option<String>,
    pub notes: Option<String>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            order_type: model.order_type,
            status: model.status,
            supplier_id: model.supplier_id,
            customer_id: model.customer_id,
            total_amount: model.total_amount,
            payment_status: model.payment_status,
            rejection_reason: model.rejection_reason,
            gateway_order_ref: model.gateway_order_ref,
            gateway_payment_ref: model.gateway_payment_ref,
            notes: model.notes,
            actual_delivery_date: model.actual_delivery_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub requested_price: Decimal,
    pub proposed_price: Option<Decimal>,
    pub negotiation_status: String,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            requested_price: model.requested_price,
            proposed_price: model.proposed_price,
            negotiation_status: model.negotiation_status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryResponse {
    pub id: Uuid,
    pub status: String,
    pub changed_by: String,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_status_history::Model> for StatusHistoryResponse {
    fn from(model: order_status_history::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            changed_by: model.changed_by,
            comments: model.comments,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub checked_by: String,
    pub status: String,
    pub comments: Option<String>,
    #[schema(value_type = Object)]
    pub parameters: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<quality_check::Model> for QualityCheckResponse {
    fn from(model: quality_check::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            checked_by: model.checked_by,
            status: model.status,
            comments: model.comments,
            parameters: model.parameters,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckEnvelope {
    pub message: String,
    pub quality_check: QualityCheckResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredEnvelope {
    pub message: String,
    pub order_delivered: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelEnvelope {
    pub message: String,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub history: Vec<StatusHistoryResponse>,
}

/// Review the proposed negotiation price for a supplier order.
#[utoipa::path(
    patch,
    path = "/api/v1/pricedecision/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = PriceDecisionRequest,
    responses(
        (status = 200, description = "Decision applied", body = OrderResponse),
        (status = 400, description = "Invalid input or order state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn price_decision(
    State(state): State<AppState>,
    user: ActingUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<PriceDecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let decision = PriceDecision::from_request(&payload.decision);
    let updated = state
        .services
        .lifecycle
        .review_price_proposal(order_id, decision, payload.negotiation_notes, user.as_str())
        .await
        .map_err(map_service_error)?;

    info!(order_id = %order_id, status = %updated.status, "Price decision handled");

    Ok(success_response(OrderResponse::from(updated)))
}

/// Record a quality check against an order.
#[utoipa::path(
    patch,
    path = "/api/v1/qc/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = QualityCheckRequest,
    responses(
        (status = 200, description = "Quality check recorded", body = QualityCheckEnvelope),
        (status = 400, description = "Invalid input or order state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn quality_check(
    State(state): State<AppState>,
    user: ActingUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<QualityCheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let qc_status: QcStatus = payload.qc_status.trim().parse().map_err(|_| {
        ApiError::ValidationError(format!("Invalid QC status '{}'", payload.qc_status))
    })?;

    let record = state
        .services
        .lifecycle
        .quality_check(
            order_id,
            qc_status,
            payload.rejection_reason,
            payload.comments,
            payload.parameters,
            user.as_str(),
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(QualityCheckEnvelope {
        message: "Quality check recorded".to_string(),
        quality_check: record.into(),
    }))
}

/// Confirm or reject delivery of an order.
#[utoipa::path(
    patch,
    path = "/api/v1/deliveredConfirmation/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = DeliveredConfirmationRequest,
    responses(
        (status = 200, description = "Delivery confirmation applied", body = DeliveredEnvelope),
        (status = 400, description = "Invalid input or order state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn delivered_confirmation(
    State(state): State<AppState>,
    user: ActingUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<DeliveredConfirmationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let delivery_status: DeliveryStatus =
        payload.delivery_status.trim().parse().map_err(|_| {
            ApiError::ValidationError(format!(
                "Invalid delivery status '{}'",
                payload.delivery_status
            ))
        })?;

    let updated = state
        .services
        .lifecycle
        .mark_delivered(
            order_id,
            delivery_status,
            payload.rejection_reason,
            user.as_str(),
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DeliveredEnvelope {
        message: "Delivery confirmation recorded".to_string(),
        order_delivered: updated.into(),
    }))
}

/// Cancel an order.
#[utoipa::path(
    post,
    path = "/api/v1/cancel-order",
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = CancelEnvelope),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already cancelled", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: ActingUser,
    Json(payload): Json<CancelOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .lifecycle
        .cancel_order(payload.order_id, user.as_str())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CancelEnvelope {
        message: "Order cancelled".to_string(),
        order: updated.into(),
    }))
}

/// Fetch an order with its line items and audit trail.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = OrderDetailResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (order_row, items, history) = state
        .services
        .lifecycle
        .get_order_with_details(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderDetailResponse {
        order: order_row.into(),
        items: items.into_iter().map(Into::into).collect(),
        history: history.into_iter().map(Into::into).collect(),
    }))
}

/// Creates the router for order lifecycle endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/pricedecision/:order_id", patch(price_decision))
        .route("/qc/:order_id", patch(quality_check))
        .route("/deliveredConfirmation/:order_id", patch(delivered_confirmation))
        .route("/cancel-order", post(cancel_order))
        .route("/orders/:order_id", get(get_order))
}
