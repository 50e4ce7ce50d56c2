use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    db::DbPool,
    dto::auth::{LoginRequest, LoginResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", post(login))
        .route("/current", get(current).delete(logout))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Sessions"
)]
pub async fn login(
    State(pool): State<DbPool>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sessions/current",
    responses((status = 200, description = "Authenticated user", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
pub async fn current(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::current_user(&pool, &user).await?;
    Ok(Json(resp))
}

// Tokens are stateless; logout is an acknowledgement for the client.
#[utoipa::path(
    delete,
    path = "/api/sessions/current",
    responses((status = 200, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
pub async fn logout(_user: AuthUser) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(ApiResponse::acknowledged("Logged out")))
}
