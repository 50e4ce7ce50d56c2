use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart not found")]
    CartNotFound,

    #[error("Review not found")]
    ReviewNotFound,

    #[error("Username already taken")]
    UserAlreadyExists,

    #[error("Product model already registered")]
    ProductAlreadyExists,

    #[error("You have already reviewed this product")]
    ReviewAlreadyExists,

    #[error("Product is out of stock")]
    EmptyProductStock,

    #[error("Not enough stock for the requested quantity")]
    LowProductStock,

    #[error("Cart has no items")]
    EmptyCart,

    #[error("Product is not in the cart")]
    ProductNotInCart,

    #[error("Admin accounts can only be managed by themselves")]
    UserIsAdmin,

    #[error("Only an admin or the account owner may do this")]
    UserNotAdmin,

    #[error("Admins cannot edit other admin accounts")]
    UnauthorizedUser,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid date")]
    DateError,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UserNotFound
            | AppError::ProductNotFound
            | AppError::CartNotFound
            | AppError::ReviewNotFound => StatusCode::NOT_FOUND,

            AppError::UserAlreadyExists
            | AppError::ProductAlreadyExists
            | AppError::ReviewAlreadyExists
            | AppError::EmptyProductStock
            | AppError::LowProductStock
            | AppError::EmptyCart
            | AppError::ProductNotInCart
            | AppError::UserIsAdmin => StatusCode::CONFLICT,

            AppError::UserNotAdmin
            | AppError::UnauthorizedUser
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            AppError::Forbidden => StatusCode::FORBIDDEN,

            AppError::DateError | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,

            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // Store-level failures surface as an opaque 503; the sqlx detail
            // stays in the logs, never in the client body.
            AppError::DbError(_) | AppError::Internal(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
