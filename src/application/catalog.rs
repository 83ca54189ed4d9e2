use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{ListResult, Product};

use super::normalize_page;

pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Inactive products are reported as missing.
    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .filter(Product::is_orderable)
            .ok_or_else(|| DomainError::NotFound(format!("Product {id} not found")))
    }

    pub fn list_products(&self, page: i64, limit: i64) -> Result<ListResult<Product>, DomainError> {
        let (page, limit) = normalize_page(page, limit);
        self.products.list_active(page, limit)
    }
}
