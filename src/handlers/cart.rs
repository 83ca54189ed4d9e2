use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ErrorResponse;
use crate::auth::AuthenticatedUser;
use crate::domain::cart::CartLine;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub added_at: String,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            size: line.size,
            added_at: line.added_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
}

/// POST /api/cart
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line added to the cart", body = CartLineResponse),
        (status = 400, description = "Invalid quantity or not enough stock", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session token", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let cart = state.cart.clone();

    let line = web::block(move || {
        cart.add_to_cart(user.user_id, body.product_id, body.quantity, body.size)
    })
    .await??;

    Ok(HttpResponse::Created().json(CartLineResponse::from(line)))
}

/// GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "The session user's cart", body = CartResponse),
        (status = 401, description = "Missing or invalid session token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn list_cart(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = state.cart.clone();

    let lines = web::block(move || cart.list_cart(user.user_id)).await??;

    Ok(HttpResponse::Ok().json(CartResponse {
        items: lines.into_iter().map(CartLineResponse::from).collect(),
    }))
}
