use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Insufficient stock for {product}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("Payment verification failed")]
    SignatureMismatch,
    #[error("{0}")]
    Conflict(String),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Raised when a gateway payment id has already been turned into an order.
    pub fn payment_already_processed(payment_id: &str) -> Self {
        DomainError::Conflict(format!("Payment {payment_id} has already been processed"))
    }
}
