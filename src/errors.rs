use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(_)
            | DomainError::InsufficientStock { .. }
            | DomainError::SignatureMismatch => AppError::BadRequest(e.to_string()),
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::Unauthorized(msg) => AppError::Unauthorized(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Gateway(_) => AppError::BadGateway(e.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::ResponseError;

    fn body_json(err: AppError) -> serde_json::Value {
        let bytes = err
            .error_response()
            .into_body()
            .try_into_bytes()
            .expect("error bodies are buffered");
        serde_json::from_slice(&bytes).expect("error body is JSON")
    }

    #[test]
    fn insufficient_stock_maps_to_400_with_message() {
        let err: AppError = DomainError::InsufficientStock {
            product: "Tee".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(err)["error"],
            "Insufficient stock for Tee. Available: 1, Requested: 2"
        );
    }

    #[test]
    fn signature_mismatch_maps_to_400() {
        let err: AppError = DomainError::SignatureMismatch.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(err)["error"], "Payment verification failed");
    }

    #[test]
    fn not_found_returns_404() {
        let err: AppError = DomainError::NotFound("Order x not found".to_string()).into();
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_returns_401() {
        let err: AppError = DomainError::Unauthorized("Missing session".to_string()).into();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn replayed_payment_returns_409() {
        let err: AppError = DomainError::payment_already_processed("pay_1").into();
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn gateway_failure_returns_502() {
        let err: AppError = DomainError::Gateway("timeout".to_string()).into();
        assert_eq!(err.error_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = AppError::Internal("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(err);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }
}
