use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};

use crate::{
    db::DbPool,
    dto::reviews::{AddReviewRequest, ReviewList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ProductReview,
    response::ApiResponse,
    services::review_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", delete(delete_all_reviews))
        .route(
            "/{model}",
            post(add_review).get(list_reviews).delete(delete_review),
        )
        .route("/{model}/all", delete(delete_reviews_of_product))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{model}",
    params(("model" = String, Path)),
    request_body = AddReviewRequest,
    responses(
        (status = 200, description = "Review added", body = ApiResponse<ProductReview>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Already reviewed"),
        (status = 422, description = "Bad score or empty comment"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn add_review(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
    Json(payload): Json<AddReviewRequest>,
) -> AppResult<Json<ApiResponse<ProductReview>>> {
    let resp = review_service::add_review(&pool, &user, &model, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{model}",
    params(("model" = String, Path)),
    responses(
        (status = 200, description = "Reviews of the model", body = ApiResponse<ReviewList>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(pool): State<DbPool>,
    _user: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&pool, &model).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{model}",
    params(("model" = String, Path)),
    responses(
        (status = 200, description = "Own review deleted"),
        (status = 404, description = "Product or review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = review_service::delete_review(&pool, &user, &model).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{model}/all",
    params(("model" = String, Path)),
    responses(
        (status = 200, description = "All reviews of the model deleted"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_reviews_of_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = review_service::delete_reviews_of_product(&pool, &user, &model).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reviews",
    responses((status = 200, description = "Every review deleted")),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_all_reviews(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = review_service::delete_all_reviews(&pool, &user).await?;
    Ok(Json(resp))
}
