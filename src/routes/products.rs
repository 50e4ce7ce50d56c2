use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};

use crate::{
    db::DbPool,
    dto::products::{
        ProductList, QuantityResponse, RegisterProductRequest, RestockRequest, SellRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin_or_manager},
    models::Product,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::product_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route(
            "/",
            post(register_product)
                .get(list_products)
                .delete(delete_all_products),
        )
        .route("/available", get(list_available_products))
        .route("/{model}", patch(restock_product).delete(delete_product))
        .route("/{model}/sell", patch(sell_product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = RegisterProductRequest,
    responses(
        (status = 200, description = "Register product", body = ApiResponse<Product>),
        (status = 409, description = "Model already registered"),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn register_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<RegisterProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::register_product(&pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{model}",
    params(("model" = String, Path)),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "New quantity", body = ApiResponse<QuantityResponse>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Bad change date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn restock_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<ApiResponse<QuantityResponse>>> {
    let resp = product_service::increase_quantity(&pool, &user, &model, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{model}/sell",
    params(("model" = String, Path)),
    request_body = SellRequest,
    responses(
        (status = 200, description = "New quantity", body = ApiResponse<QuantityResponse>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Stock empty or too low"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn sell_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
    Json(payload): Json<SellRequest>,
) -> AppResult<Json<ApiResponse<QuantityResponse>>> {
    let resp = product_service::sell_product(&pool, &user, &model, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("grouping" = Option<String>, Query, description = "category or model"),
        ("category" = Option<String>, Query),
        ("model" = Option<String>, Query),
    ),
    responses(
        (status = 200, description = "Products", body = ApiResponse<ProductList>),
        (status = 404, description = "Model filter matched nothing"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    ensure_admin_or_manager(&user)?;
    let resp = product_service::list_products(&pool, query, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/available",
    params(
        ("grouping" = Option<String>, Query, description = "category or model"),
        ("category" = Option<String>, Query),
        ("model" = Option<String>, Query),
    ),
    responses(
        (status = 200, description = "Products in stock", body = ApiResponse<ProductList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_available_products(
    State(pool): State<DbPool>,
    _user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&pool, query, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{model}",
    params(("model" = String, Path)),
    responses(
        (status = 200, description = "Product and its cart lines and reviews deleted"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&pool, &user, &model).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products",
    responses((status = 200, description = "Catalog cleared")),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_all_products(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_all_products(&pool, &user).await?;
    Ok(Json(resp))
}
