use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartLine, NewCartLine};
use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, CustomerDirectory};
use crate::schema::{cart_items, customers};

use super::models::{CartItemRow, CustomerRow, NewCartItemRow};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn add(&self, line: NewCartLine) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                id: Uuid::new_v4(),
                user_id: line.user_id,
                product_id: line.product_id,
                quantity: line.quantity,
                size: line.size,
                added_at: Utc::now(),
            })
            .returning(CartItemRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = cart_items::table
            .filter(cart_items::user_id.eq(user_id))
            .select(CartItemRow::as_select())
            .order(cart_items::added_at.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    fn delete_added_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(cart_items::table.filter(cart_items::added_at.lt(cutoff)))
            .execute(&mut conn)?;
        Ok(deleted)
    }
}

pub struct DieselCustomerDirectory {
    pool: DbPool,
}

impl DieselCustomerDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CustomerDirectory for DieselCustomerDirectory {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }
}
