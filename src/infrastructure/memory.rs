//! A process-local store implementing every repository port.
//!
//! One mutex guards all tables, so [`OrderRepository::place`] is atomic the
//! same way a database transaction is: every check runs before any write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::{CartLine, NewCartLine};
use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, OrderItemView, OrderView, StockPolicy};
use crate::domain::ports::{CartRepository, CustomerDirectory, OrderRepository, ProductRepository};
use crate::domain::product::{page_offset, ListResult, Product};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    cart_items: Vec<CartLine>,
    orders: Vec<OrderView>,
    customers: HashMap<Uuid, Customer>,
    fail_commits: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, name: &str, price: BigDecimal, stock: i32) -> Uuid {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            stock,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let id = product.id;
        self.tables().products.insert(id, product);
        id
    }

    pub fn set_price(&self, product_id: Uuid, price: BigDecimal) {
        if let Some(p) = self.tables().products.get_mut(&product_id) {
            p.price = price;
            p.updated_at = Utc::now();
        }
    }

    pub fn set_active(&self, product_id: Uuid, active: bool) {
        if let Some(p) = self.tables().products.get_mut(&product_id) {
            p.active = active;
        }
    }

    pub fn stock_of(&self, product_id: Uuid) -> Option<i32> {
        self.tables().products.get(&product_id).map(|p| p.stock)
    }

    pub fn order_count(&self) -> usize {
        self.tables().orders.len()
    }

    pub fn cart_of(&self, user_id: Uuid) -> Vec<CartLine> {
        self.tables()
            .cart_items
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Adds a cart line with an explicit timestamp, bypassing validation.
    pub fn add_cart_line_at(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        added_at: DateTime<Utc>,
    ) -> Uuid {
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            size: None,
            added_at,
        };
        let id = line.id;
        self.tables().cart_items.push(line);
        id
    }

    pub fn add_customer(&self, email: &str, name: &str) -> Uuid {
        let customer = Customer {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
        };
        let id = customer.id;
        self.tables().customers.insert(id, customer);
        id
    }

    /// Makes every following [`OrderRepository::place`] fail before writing.
    pub fn fail_commits(&self, fail: bool) {
        self.tables().fail_commits = fail;
    }
}

fn page_bounds(page: i64, limit: i64) -> (usize, usize) {
    let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
    (offset, usize::try_from(limit).unwrap_or(0))
}

impl ProductRepository for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.tables().products.get(&id).cloned())
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    fn list_active(&self, page: i64, limit: i64) -> Result<ListResult<Product>, DomainError> {
        let tables = self.tables();
        let mut active: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));

        let (offset, limit) = page_bounds(page, limit);
        Ok(ListResult {
            total: active.len() as i64,
            items: active.into_iter().skip(offset).take(limit).collect(),
        })
    }
}

impl CartRepository for InMemoryStore {
    fn add(&self, line: NewCartLine) -> Result<CartLine, DomainError> {
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id: line.user_id,
            product_id: line.product_id,
            quantity: line.quantity,
            size: line.size,
            added_at: Utc::now(),
        };
        self.tables().cart_items.push(line.clone());
        Ok(line)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        Ok(self.cart_of(user_id))
    }

    fn delete_added_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tables = self.tables();
        let before = tables.cart_items.len();
        tables.cart_items.retain(|l| l.added_at >= cutoff);
        Ok(before - tables.cart_items.len())
    }
}

impl OrderRepository for InMemoryStore {
    fn place(&self, order: NewOrder, policy: StockPolicy) -> Result<Uuid, DomainError> {
        let mut tables = self.tables();
        if tables.fail_commits {
            return Err(DomainError::Internal("simulated store failure".to_string()));
        }

        if let Some(gateway) = &order.gateway {
            let replayed = tables
                .orders
                .iter()
                .any(|o| o.gateway_payment_id.as_deref() == Some(gateway.payment_id.as_str()));
            if replayed {
                return Err(DomainError::payment_already_processed(&gateway.payment_id));
            }
        }

        // Stage every decrement first so a failure leaves the tables untouched.
        let mut staged = Vec::new();
        for (product_id, quantity) in order.quantities_by_product()? {
            let product = tables.products.get(&product_id).ok_or_else(|| {
                DomainError::Internal(format!("product {product_id} vanished during checkout"))
            })?;
            if policy == StockPolicy::Guarded && product.stock < quantity {
                return Err(DomainError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: quantity,
                });
            }
            let remaining = product.stock.checked_sub(quantity).ok_or_else(|| {
                DomainError::Internal(format!("stock for product {product_id} out of range"))
            })?;
            staged.push((product_id, remaining));
        }

        let now = Utc::now();
        for (product_id, stock) in staged {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock = stock;
                product.updated_at = now;
            }
        }

        let order_id = Uuid::new_v4();
        tables.orders.push(OrderView {
            id: order_id,
            user_id: order.purchaser.user_id(),
            total_price: order.total_price,
            gateway_order_id: order.gateway.as_ref().map(|g| g.order_id.clone()),
            gateway_payment_id: order.gateway.as_ref().map(|g| g.payment_id.clone()),
            created_at: now,
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemView {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    size: i.size,
                })
                .collect(),
        });

        if let Some(user_id) = order.purchaser.user_id() {
            tables.cart_items.retain(|l| l.user_id != user_id);
        }

        Ok(order_id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.tables().orders.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError> {
        let tables = self.tables();
        let (offset, limit) = page_bounds(page, limit);
        Ok(ListResult {
            total: tables.orders.len() as i64,
            items: tables
                .orders
                .iter()
                .rev()
                .skip(offset)
                .take(limit)
                .map(|o| OrderView {
                    items: vec![],
                    ..o.clone()
                })
                .collect(),
        })
    }
}

impl CustomerDirectory for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.tables().customers.get(&id).cloned())
    }
}
