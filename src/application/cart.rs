use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::cart::{CartLine, NewCartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductRepository};

pub struct CartService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    ttl: chrono::Duration,
}

impl CartService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            products,
            carts,
            ttl,
        }
    }

    pub fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        size: Option<String>,
    ) -> Result<CartLine, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        // cart_items.size is VARCHAR(50).
        if size.as_ref().is_some_and(|s| s.chars().count() > 50) {
            return Err(DomainError::Validation(
                "Size must be at most 50 characters".to_string(),
            ));
        }
        let product = self
            .products
            .find_by_id(product_id)?
            .filter(|p| p.is_orderable())
            .ok_or_else(|| DomainError::NotFound(format!("Product {product_id} not found")))?;
        if quantity > product.stock {
            return Err(DomainError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: quantity,
            });
        }

        let line = self.carts.add(NewCartLine {
            user_id,
            product_id,
            quantity,
            size: size.filter(|s| !s.trim().is_empty()),
        })?;
        log::debug!(
            "user {} added {} x {} to cart",
            user_id,
            quantity,
            product_id
        );
        Ok(line)
    }

    pub fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        self.carts.list_for_user(user_id)
    }

    /// Deletes cart lines older than the TTL as of `now`.
    pub fn sweep_stale_carts(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let deleted = self.carts.delete_added_before(now - self.ttl)?;
        if deleted > 0 {
            log::info!("cart sweep removed {} stale line(s)", deleted);
        }
        Ok(deleted)
    }
}

/// Runs [`CartService::sweep_stale_carts`] every `every` on the blocking pool.
pub fn spawn_cart_sweeper(service: Arc<CartService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let svc = Arc::clone(&service);
            match tokio::task::spawn_blocking(move || svc.sweep_stale_carts(Utc::now())).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => log::error!("cart sweep failed: {}", e),
                Err(e) => log::error!("cart sweep task panicked: {}", e),
            }
        }
    })
}
