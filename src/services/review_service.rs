use chrono::Utc;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::reviews::{AddReviewRequest, ReviewList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin_or_manager, ensure_customer},
    models::ProductReview,
    response::{ApiResponse, Meta},
};

async fn product_exists(pool: &DbPool, model: &str) -> AppResult<()> {
    let exist: Option<(String,)> = sqlx::query_as("SELECT model FROM products WHERE model = $1")
        .bind(model)
        .fetch_optional(pool)
        .await?;
    match exist {
        Some(_) => Ok(()),
        None => Err(AppError::ProductNotFound),
    }
}

/// One review per (model, customer); the review is dated today.
pub async fn add_review(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
    payload: AddReviewRequest,
) -> AppResult<ApiResponse<ProductReview>> {
    ensure_customer(user)?;

    if !(1..=5).contains(&payload.score) {
        return Err(AppError::Validation("score must be between 1 and 5".into()));
    }
    if payload.comment.trim().is_empty() {
        return Err(AppError::Validation("comment must not be empty".into()));
    }

    product_exists(pool, model).await?;

    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT score FROM reviews WHERE model = $1 AND username = $2")
            .bind(model)
            .bind(user.username.as_str())
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::ReviewAlreadyExists);
    }

    let review: ProductReview = sqlx::query_as(
        r#"
        INSERT INTO reviews (model, username, score, date, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING model, username, score, date, comment
        "#,
    )
    .bind(model)
    .bind(user.username.as_str())
    .bind(payload.score)
    .bind(Utc::now().date_naive())
    .bind(payload.comment)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "review_add",
        Some("reviews"),
        Some(serde_json::json!({ "model": model, "score": review.score })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Review added", review, Some(Meta::empty())))
}

/// Reviews of a model. An unknown model is an error; a known model with no
/// reviews is an empty list.
pub async fn list_reviews(pool: &DbPool, model: &str) -> AppResult<ApiResponse<ReviewList>> {
    product_exists(pool, model).await?;

    let items = sqlx::query_as::<_, ProductReview>(
        "SELECT model, username, score, date, comment FROM reviews WHERE model = $1 ORDER BY date, username",
    )
    .bind(model)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("Reviews", ReviewList { items }, None))
}

/// Delete the caller's own review of a model.
pub async fn delete_review(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;

    product_exists(pool, model).await?;

    let result = sqlx::query("DELETE FROM reviews WHERE model = $1 AND username = $2")
        .bind(model)
        .bind(user.username.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ReviewNotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "review_delete",
        Some("reviews"),
        Some(serde_json::json!({ "model": model })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("Review deleted"))
}

/// Wipe every review of one model.
pub async fn delete_reviews_of_product(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin_or_manager(user)?;

    product_exists(pool, model).await?;

    sqlx::query("DELETE FROM reviews WHERE model = $1")
        .bind(model)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "reviews_delete_for_product",
        Some("reviews"),
        Some(serde_json::json!({ "model": model })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("Reviews deleted"))
}

pub async fn delete_all_reviews(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin_or_manager(user)?;

    sqlx::query("DELETE FROM reviews").execute(pool).await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "reviews_delete_all",
        Some("reviews"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("All reviews deleted"))
}
