use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::{CartLine, NewCartLine};
use super::customer::Customer;
use super::errors::DomainError;
use super::order::{NewOrder, OrderView, StockPolicy};
use super::product::{ListResult, Product};

pub trait ProductRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Products matching `ids`; unknown ids are simply absent from the result.
    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn list_active(&self, page: i64, limit: i64) -> Result<ListResult<Product>, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn add(&self, line: NewCartLine) -> Result<CartLine, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    /// Deletes every line added before `cutoff` and returns how many went.
    fn delete_added_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order and its items, decrements stock and clears the
    /// purchaser's cart in one transaction. Nothing is persisted on error.
    fn place(&self, order: NewOrder, policy: StockPolicy) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError>;
}

pub trait CustomerDirectory: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_order(
        &self,
        amount: &BigDecimal,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError>;
}
