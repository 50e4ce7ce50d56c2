use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    db::DbPool,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::ApiResponse,
    services::{auth_service, user_service},
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", post(register).get(list_users).delete(delete_all_users))
        .route("/roles/{role}", get(list_users_by_role))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Register user", body = ApiResponse<User>),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "Users"
)]
pub async fn register(
    State(pool): State<DbPool>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::register_user(&pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/roles/{role}",
    params(("role" = String, Path, description = "Customer, Manager or Admin")),
    responses(
        (status = 200, description = "Users with the role", body = ApiResponse<UserList>),
        (status = 422, description = "Unknown role"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users_by_role(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(role): Path<String>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let role = role
        .parse::<Role>()
        .map_err(|_| AppError::Validation(format!("unknown role: {role}")))?;
    let resp = user_service::list_users_by_role(&pool, &user, role).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(("username" = String, Path)),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 401, description = "Not the owner nor an admin"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&pool, &user, &username).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/users/{username}",
    params(("username" = String, Path)),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<User>),
        (status = 401, description = "Not allowed to edit this account"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_user(&pool, &user, &username, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{username}",
    params(("username" = String, Path)),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Not allowed to delete this account"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Target is another admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_user(&pool, &user, &username).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users",
    responses(
        (status = 200, description = "All non-admin users deleted"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_all_users(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_all_users(&pool, &user).await?;
    Ok(Json(resp))
}
