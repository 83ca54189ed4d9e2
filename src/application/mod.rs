pub mod cart;
pub mod catalog;
pub mod checkout;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamps a 1-based page and a limit into the range the repositories accept.
pub fn normalize_page(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, MAX_PAGE_LIMIT))
}
