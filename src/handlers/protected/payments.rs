// handlers/protected/payments.rs - gateway order creation and signature check
use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{parse_id, required, JsonBody};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::payment::{OrderRequest, PaymentGateway};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub course_id: Option<String>,
    /// Major units; the course price when omitted
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
}

fn gateway(state: &AppState) -> Result<Arc<dyn PaymentGateway>, ApiError> {
    state
        .payments
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("Payments are not configured"))
}

/// POST /api/v1/payments/createOrder
///
/// Expected Input:
/// ```json
/// { "courseId": "…", "amount": 499 }
/// ```
///
/// The gateway's order object is returned as `data`.
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateOrderRequest>,
) -> ApiResult<Value> {
    let gateway = gateway(&state)?;
    let course_id = parse_id(&required(payload.course_id, "courseId")?, "course")?;
    let course = state
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let amount = payload.amount.unwrap_or(course.price);
    let order = OrderRequest::new(amount, &state.config.payment.currency)?;
    let receipt = order.receipt.clone();

    let created = gateway.create_order(order).await?;
    info!("Created payment order {} for course {}", receipt, course_id);
    Ok(ApiResponse::success(created, "Order created"))
}

/// POST /api/v1/payments/verifyPayment - `{ "orderId", "paymentId", "signature" }`
pub async fn verify_payment(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VerifyPaymentRequest>,
) -> ApiResult<Value> {
    let gateway = gateway(&state)?;
    let order_id = required(payload.order_id, "orderId")?;
    let payment_id = required(payload.payment_id, "paymentId")?;
    let signature = required(payload.signature, "signature")?;

    if !gateway.verify(&order_id, &payment_id, &signature) {
        warn!("Payment signature mismatch for order {}", order_id);
        return Err(ApiError::bad_request("Payment not verified"));
    }

    Ok(ApiResponse::success(
        json!({ "orderId": order_id, "paymentId": payment_id }),
        "Payment verified",
    ))
}
