use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the replenishment and settlement API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "restock-api",
        description = "Demand-driven inventory replenishment, supplier order lifecycle, and payment settlement"
    ),
    paths(
        crate::handlers::reorder::trigger_reorder,
        crate::handlers::orders::price_decision,
        crate::handlers::orders::quality_check,
        crate::handlers::orders::delivered_confirmation,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::get_order,
        crate::handlers::payments::process_payment,
        crate::handlers::inventory::list_inventory,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::reorder::ReorderScanResponse,
        crate::handlers::reorder::ReorderDetail,
        crate::handlers::orders::PriceDecisionRequest,
        crate::handlers::orders::QualityCheckRequest,
        crate::handlers::orders::DeliveredConfirmationRequest,
        crate::handlers::orders::CancelOrderRequest,
        crate::handlers::orders::OrderResponse,
        crate::handlers::orders::OrderItemResponse,
        crate::handlers::orders::StatusHistoryResponse,
        crate::handlers::orders::QualityCheckResponse,
        crate::handlers::orders::QualityCheckEnvelope,
        crate::handlers::orders::DeliveredEnvelope,
        crate::handlers::orders::CancelEnvelope,
        crate::handlers::orders::OrderDetailResponse,
        crate::handlers::payments::ProcessPaymentRequest,
        crate::handlers::payments::ProcessPaymentResponse,
        crate::handlers::inventory::InventoryItemResponse,
        crate::handlers::inventory::InventoryListResponse,
    )),
    tags(
        (name = "Reorder", description = "Demand-driven replenishment scan"),
        (name = "Orders", description = "Order lifecycle transitions"),
        (name = "Payments", description = "Payment settlement"),
        (name = "Inventory", description = "Inventory read models")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
