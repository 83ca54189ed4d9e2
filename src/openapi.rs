use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{self, cart, orders, payments, products};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        products::list_products,
        products::get_product,
        cart::add_to_cart,
        cart::list_cart,
        orders::place_order,
        orders::get_order,
        orders::list_orders,
        payments::create_payment_order,
        payments::verify_payment,
    ),
    components(schemas(
        handlers::ErrorResponse,
        handlers::HealthResponse,
        products::ProductResponse,
        products::ListProductsResponse,
        cart::AddToCartRequest,
        cart::CartLineResponse,
        cart::CartResponse,
        orders::OrderItemRequest,
        orders::PlaceOrderRequest,
        orders::CheckoutResponse,
        orders::OrderItemResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        payments::CreatePaymentOrderRequest,
        payments::PaymentOrderResponse,
        payments::VerifyPaymentRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "products", description = "Storefront catalog"),
        (name = "cart", description = "Session user's cart"),
        (name = "orders", description = "Order placement and lookup"),
        (name = "payments", description = "Gateway orders and payment verification"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
