use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::common::{map_service_error, success_response, validate_input};
use super::orders::OrderResponse;
use super::ActingUser;
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::payments::SettlementRequest,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    #[validate(length(min = 1, message = "Gateway order reference is required"))]
    pub gateway_order_ref: String,
    #[validate(length(min = 1, message = "Payment reference is required"))]
    pub payment_ref: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentResponse {
    pub message: String,
    pub order: OrderResponse,
}

/// Verify a payment callback and settle the order: mark it paid and
/// reconcile every line item against inventory and the sales ledger.
#[utoipa::path(
    post,
    path = "/api/v1/process-payment",
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Payment settled", body = ProcessPaymentResponse),
        (status = 400, description = "Missing fields or invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already processed or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn process_payment(
    State(state): State<AppState>,
    user: ActingUser,
    Json(payload): Json<ProcessPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let request = SettlementRequest {
        gateway_order_ref: payload.gateway_order_ref,
        payment_ref: payload.payment_ref,
        signature: payload.signature,
    };

    let updated = state
        .services
        .settlement
        .process_payment(request, user.as_str())
        .await
        .map_err(map_service_error)?;

    info!(order_id = %updated.id, "Payment settlement handled");

    Ok(success_response(ProcessPaymentResponse {
        message: "Payment processed and order settled".to_string(),
        order: updated.into(),
    }))
}

/// Creates the router for payment endpoints
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/process-payment", post(process_payment))
}
