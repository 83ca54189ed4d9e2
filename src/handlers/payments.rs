use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::orders::{CheckoutResponse, OrderItemRequest};
use super::{parse_amount, ErrorResponse};
use crate::auth::AuthenticatedUser;
use crate::domain::order::OrderLineInput;
use crate::domain::payment::PaymentConfirmation;
use crate::domain::ports::GatewayOrder;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentOrderRequest {
    /// Decimal amount in major units as a string, e.g. "499.00"
    pub amount: String,
    pub receipt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentOrderResponse {
    pub id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

impl From<GatewayOrder> for PaymentOrderResponse {
    fn from(o: GatewayOrder) -> Self {
        Self {
            id: o.id,
            amount: o.amount,
            currency: o.currency,
            receipt: o.receipt,
            status: o.status,
        }
    }
}

/// What the client checkout flow hands back after a successful payment,
/// plus the order it pays for.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
    /// Decimal total as a string, e.g. "19.98"
    pub total_price: String,
    pub items: Vec<OrderItemRequest>,
}

/// POST /api/payments/orders
///
/// Creates the gateway order a client checkout pays against.
#[utoipa::path(
    post,
    path = "/api/payments/orders",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 201, description = "Gateway order created", body = PaymentOrderResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 502, description = "Payment gateway error", body = ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn create_payment_order(
    state: web::Data<AppState>,
    body: web::Json<CreatePaymentOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let amount = parse_amount("amount", &body.amount)?;

    let order = state
        .checkout
        .create_payment_order(&amount, body.receipt)
        .await?;

    Ok(HttpResponse::Created().json(PaymentOrderResponse::from(order)))
}

/// POST /api/payments/verify
///
/// Validates stock, verifies the payment signature and only then places the
/// order for the session user. The confirmation email is sent afterwards and
/// cannot fail this request.
#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 201, description = "Payment verified and order placed", body = CheckoutResponse),
        (status = 400, description = "Bad request, stock or signature", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session token", body = ErrorResponse),
        (status = 409, description = "Payment already processed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "payments"
)]
pub async fn verify_payment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let total_price = parse_amount("total_price", &body.total_price)?;
    let confirmation = PaymentConfirmation {
        gateway_order_id: body.gateway_order_id,
        gateway_payment_id: body.gateway_payment_id,
        signature: body.signature,
    };
    let lines: Vec<OrderLineInput> = body.items.into_iter().map(OrderLineInput::from).collect();
    let checkout = state.checkout.clone();

    let order_id = web::block(move || {
        checkout.place_paid_order(user.user_id, &confirmation, total_price, lines)
    })
    .await??;

    Ok(HttpResponse::Created().json(CheckoutResponse::placed(order_id)))
}
