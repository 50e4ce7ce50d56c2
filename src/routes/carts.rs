use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};

use crate::{
    db::DbPool,
    dto::carts::{AddToCartRequest, CartDto, CartList, CheckoutRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route(
            "/",
            get(current_cart)
                .post(add_to_cart)
                .patch(checkout)
                .delete(delete_all_carts),
        )
        .route("/history", get(history))
        .route("/all", get(list_all_carts))
        .route("/current", delete(clear_current_cart))
        .route("/products/{model}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/carts",
    responses(
        (status = 200, description = "Current cart, empty if none exists", body = ApiResponse<CartDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn current_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::current_cart(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/carts",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartDto>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product out of stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn add_to_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::add_product_to_cart(&pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/carts",
    params(
        ("payment_date" = Option<String>, Query, description = "YYYY-MM-DD, defaults to today"),
    ),
    responses(
        (status = 200, description = "Paid cart", body = ApiResponse<CartDto>),
        (status = 404, description = "No unpaid cart"),
        (status = 409, description = "Cart empty, or a line exceeds live stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn checkout(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(payload): Query<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::checkout(&pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/carts/history",
    responses((status = 200, description = "Paid carts", body = ApiResponse<CartList>)),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn history(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::history(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/carts/products/{model}",
    params(("model" = String, Path)),
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartDto>),
        (status = 404, description = "No unpaid cart or unknown model"),
        (status = 409, description = "Product not in the cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn remove_from_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::remove_product_from_cart(&pool, &user, &model).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/carts/current",
    responses(
        (status = 200, description = "Cart emptied"),
        (status = 404, description = "No unpaid cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn clear_current_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::clear_current_cart(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/carts/all",
    responses((status = 200, description = "Every cart", body = ApiResponse<CartList>)),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn list_all_carts(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_all_carts(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/carts",
    responses((status = 200, description = "All carts deleted")),
    security(("bearer_auth" = [])),
    tag = "Carts"
)]
pub async fn delete_all_carts(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::delete_all_carts(&pool, &user).await?;
    Ok(Json(resp))
}
