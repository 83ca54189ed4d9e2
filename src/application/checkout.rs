use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    requested_by_product, GatewayRef, NewOrder, NewOrderItem, OrderLineInput, OrderView,
    Purchaser, StockPolicy,
};
use crate::domain::payment::PaymentConfirmation;
use crate::domain::ports::{GatewayOrder, OrderRepository, PaymentGateway, ProductRepository};
use crate::domain::product::ListResult;
use crate::notify::{OrderEvents, OrderPlaced};

use super::normalize_page;

pub struct CheckoutService {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    events: OrderEvents,
    payment_secret: String,
    stock_policy: StockPolicy,
}

impl CheckoutService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        events: OrderEvents,
        payment_secret: String,
        stock_policy: StockPolicy,
    ) -> Self {
        Self {
            products,
            orders,
            gateway,
            events,
            payment_secret,
            stock_policy,
        }
    }

    /// Places an order without a payment step. The purchaser comes from the
    /// request.
    pub fn place_order(
        &self,
        purchaser: Purchaser,
        total_price: BigDecimal,
        lines: Vec<OrderLineInput>,
    ) -> Result<Uuid, DomainError> {
        let items = self.validate_stock(&total_price, &lines)?;
        self.commit(purchaser, total_price, items, None)
    }

    /// Places an order backed by a gateway payment. The purchaser is always
    /// the session user; nothing is written unless the signature verifies.
    pub fn place_paid_order(
        &self,
        user_id: Uuid,
        payment: &PaymentConfirmation,
        total_price: BigDecimal,
        lines: Vec<OrderLineInput>,
    ) -> Result<Uuid, DomainError> {
        let items = self.validate_stock(&total_price, &lines)?;

        let gateway = payment.verify(&self.payment_secret).map_err(|e| {
            log::warn!(
                "rejected payment confirmation for gateway order {} (user {}): {}",
                payment.gateway_order_id,
                user_id,
                e
            );
            e
        })?;
        log::info!(
            "payment {} verified for user {}",
            gateway.payment_id,
            user_id
        );

        self.commit(Purchaser::User(user_id), total_price, items, Some(gateway))
    }

    /// Creates the gateway-side order the client checkout flow pays against.
    pub async fn create_payment_order(
        &self,
        amount: &BigDecimal,
        receipt: Option<String>,
    ) -> Result<GatewayOrder, DomainError> {
        let receipt = receipt
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("rcpt_{}", Uuid::new_v4().simple()));
        let order = self.gateway.create_order(amount, &receipt).await?;
        log::info!(
            "created gateway order {} for {} {} (receipt {})",
            order.id,
            order.amount,
            order.currency,
            receipt
        );
        Ok(order)
    }

    /// Checks the request shape and every line against current stock, and
    /// snapshots unit prices. Read-only.
    pub fn validate_stock(
        &self,
        total_price: &BigDecimal,
        lines: &[OrderLineInput],
    ) -> Result<Vec<NewOrderItem>, DomainError> {
        validate_request(total_price, lines)?;

        let requested = requested_by_product(lines)?;
        let ids: Vec<Uuid> = requested.keys().copied().collect();
        let products: HashMap<Uuid, _> = self
            .products
            .find_many(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for (product_id, quantity) in &requested {
            let product = products
                .get(product_id)
                .filter(|p| p.is_orderable())
                .ok_or_else(|| DomainError::NotFound(format!("Product {product_id} not found")))?;
            if *quantity > product.stock {
                return Err(DomainError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: *quantity,
                });
            }
        }

        Ok(lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: products[&line.product_id].price.clone(),
                size: line.size.clone(),
            })
            .collect())
    }

    fn commit(
        &self,
        purchaser: Purchaser,
        total_price: BigDecimal,
        items: Vec<NewOrderItem>,
        gateway: Option<GatewayRef>,
    ) -> Result<Uuid, DomainError> {
        let item_count = items.len();
        let payment_id = gateway.as_ref().map(|g| g.payment_id.clone());
        let order = NewOrder {
            purchaser,
            total_price: total_price.clone(),
            gateway,
            items,
        };

        let order_id = self.orders.place(order, self.stock_policy).map_err(|e| {
            log::error!("order transaction for {:?} rolled back: {}", purchaser, e);
            e
        })?;
        log::info!(
            "order {} committed for {:?}: {} item(s), total {}",
            order_id,
            purchaser,
            item_count,
            total_price
        );

        self.events.publish(OrderPlaced {
            order_id,
            user_id: purchaser.user_id(),
            total_price,
            item_count,
            payment_id,
        });
        Ok(order_id)
    }

    pub fn get_order(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.orders
            .find_by_id(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Order {id} not found")))
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError> {
        let (page, limit) = normalize_page(page, limit);
        self.orders.list(page, limit)
    }
}

const MAX_TOTAL_PRICE: i64 = 10_000_000_000;
const MAX_SIZE_LEN: usize = 50;

fn validate_request(
    total_price: &BigDecimal,
    lines: &[OrderLineInput],
) -> Result<(), DomainError> {
    if lines.is_empty() {
        return Err(DomainError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }
    if let Some(line) = lines.iter().find(|l| l.quantity <= 0) {
        return Err(DomainError::Validation(format!(
            "Quantity for product {} must be greater than zero",
            line.product_id
        )));
    }
    if let Some(line) = lines
        .iter()
        .find(|l| l.size.as_ref().is_some_and(|s| s.chars().count() > MAX_SIZE_LEN))
    {
        return Err(DomainError::Validation(format!(
            "Size for product {} must be at most {MAX_SIZE_LEN} characters",
            line.product_id
        )));
    }
    if *total_price < BigDecimal::from(0) {
        return Err(DomainError::Validation(
            "Total price cannot be negative".to_string(),
        ));
    }
    // orders.total_price is NUMERIC(12, 2).
    if total_price.normalized().as_bigint_and_exponent().1 > 2 {
        return Err(DomainError::Validation(
            "Total price must have at most two decimal places".to_string(),
        ));
    }
    if *total_price >= BigDecimal::from(MAX_TOTAL_PRICE) {
        return Err(DomainError::Validation(format!(
            "Total price must be below {MAX_TOTAL_PRICE}"
        )));
    }
    Ok(())
}
