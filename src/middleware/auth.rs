use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{dto::auth::Claims, error::AppError, models::Role};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Customer | Role::Manager => Err(AppError::Forbidden),
    }
}

pub fn ensure_customer(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Customer => Ok(()),
        Role::Manager | Role::Admin => Err(AppError::Forbidden),
    }
}

pub fn ensure_admin_or_manager(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Admin | Role::Manager => Ok(()),
        Role::Customer => Err(AppError::Forbidden),
    }
}

/// Account-scoped reads and edits: the owner may always act, an Admin may act
/// on anyone. Everyone else is rejected with the domain's own error kind.
pub fn ensure_self_or_admin(user: &AuthUser, target_username: &str) -> Result<(), AppError> {
    if user.username == target_username {
        return Ok(());
    }
    match user.role {
        Role::Admin => Ok(()),
        Role::Customer | Role::Manager => Err(AppError::UserNotAdmin),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        let role = decoded
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::BadRequest("Invalid role in token".into()))?;

        Ok(AuthUser {
            username: decoded.claims.sub.clone(),
            role,
        })
    }
}
