use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// One requested line of a checkout, as supplied by the client.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
}

/// Who an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchaser {
    User(Uuid),
    Guest,
}

impl Purchaser {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Purchaser::User(id) => Some(*id),
            Purchaser::Guest => None,
        }
    }
}

impl From<Option<Uuid>> for Purchaser {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Purchaser::Guest, Purchaser::User)
    }
}

/// Gateway identifiers recorded on orders placed through the payment path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRef {
    pub order_id: String,
    pub payment_id: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price read during stock validation; never re-read from the product.
    pub unit_price: BigDecimal,
    pub size: Option<String>,
}

/// A stock-validated order ready to be committed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub purchaser: Purchaser,
    pub total_price: BigDecimal,
    pub gateway: Option<GatewayRef>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Total quantity per product across all items.
    pub fn quantities_by_product(&self) -> Result<BTreeMap<Uuid, i32>, DomainError> {
        sum_by_product(self.items.iter().map(|i| (i.product_id, i.quantity)))
    }
}

/// Sums requested quantities per product. The map is ordered by product id so
/// concurrent transactions touch product rows in the same order.
pub fn requested_by_product(
    lines: &[OrderLineInput],
) -> Result<BTreeMap<Uuid, i32>, DomainError> {
    sum_by_product(lines.iter().map(|l| (l.product_id, l.quantity)))
}

fn sum_by_product(
    quantities: impl Iterator<Item = (Uuid, i32)>,
) -> Result<BTreeMap<Uuid, i32>, DomainError> {
    let mut totals = BTreeMap::new();
    for (product_id, quantity) in quantities {
        let total: &mut i32 = totals.entry(product_id).or_insert(0);
        *total = total.checked_add(quantity).ok_or_else(|| {
            DomainError::Validation(format!(
                "Total quantity for product {product_id} is too large"
            ))
        })?;
    }
    Ok(totals)
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub size: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_price: BigDecimal,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// How the order transaction treats stock that changed after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Decrement unconditionally. Concurrent checkouts of the last unit can
    /// both succeed and drive stock below zero.
    #[default]
    CheckThenAct,
    /// Decrement with `stock >= quantity` in the same statement and abort the
    /// transaction when no row matches.
    Guarded,
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check_then_act" => Ok(StockPolicy::CheckThenAct),
            "guarded" => Ok(StockPolicy::Guarded),
            other => Err(format!(
                "unknown stock policy '{other}', expected 'check_then_act' or 'guarded'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id,
            quantity,
            size: None,
        }
    }

    #[test]
    fn requested_quantities_are_summed_per_product() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let totals =
            requested_by_product(&[line(a, 1), line(b, 4), line(a, 2)]).expect("sums fit");

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&a], 3);
        assert_eq!(totals[&b], 4);
    }

    #[test]
    fn overflowing_quantities_are_rejected() {
        let a = Uuid::new_v4();
        let err = requested_by_product(&[line(a, i32::MAX), line(a, i32::MAX)]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let order = NewOrder {
            purchaser: Purchaser::Guest,
            total_price: BigDecimal::from(0),
            gateway: None,
            items: vec![
                NewOrderItem {
                    product_id: a,
                    quantity: i32::MAX,
                    unit_price: BigDecimal::from(1),
                    size: None,
                },
                NewOrderItem {
                    product_id: a,
                    quantity: 1,
                    unit_price: BigDecimal::from(1),
                    size: None,
                },
            ],
        };
        assert!(order.quantities_by_product().is_err());
    }

    #[test]
    fn purchaser_from_optional_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(Purchaser::from(Some(id)), Purchaser::User(id));
        assert_eq!(Purchaser::from(None), Purchaser::Guest);
        assert_eq!(Purchaser::Guest.user_id(), None);
    }

    #[test]
    fn stock_policy_parses_known_values() {
        assert_eq!("guarded".parse(), Ok(StockPolicy::Guarded));
        assert_eq!(" Check_Then_Act ".parse(), Ok(StockPolicy::CheckThenAct));
        assert!("optimistic".parse::<StockPolicy>().is_err());
    }
}
