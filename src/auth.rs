//! Session tokens and the authenticated-user extractor.
//!
//! A token is `<user uuid>.<hex HMAC-SHA256 of the uuid>` under the session
//! secret, sent as `Authorization: Bearer <token>`.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::signature::{sign_hex, verify_hex};
use crate::state::AppState;

pub struct SessionKeys {
    secret: String,
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, DomainError> {
        let subject = user_id.to_string();
        let tag = sign_hex(self.secret.as_bytes(), subject.as_bytes())
            .ok_or_else(|| DomainError::Internal("session secret rejected by HMAC".to_string()))?;
        Ok(format!("{subject}.{tag}"))
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, DomainError> {
        let invalid = || DomainError::Unauthorized("Invalid session token".to_string());
        let (subject, tag) = token.trim().split_once('.').ok_or_else(invalid)?;
        if !verify_hex(self.secret.as_bytes(), subject.as_bytes(), tag) {
            return Err(invalid());
        }
        Uuid::parse_str(subject).map_err(|_| invalid())
    }
}

/// The user behind a valid session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let user_id = state.sessions.verify(token).map_err(|e| {
        log::warn!("rejected session token for {}: {}", req.path(), e);
        AppError::from(e)
    })?;
    Ok(AuthenticatedUser { user_id })
}
