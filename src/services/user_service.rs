use chrono::Utc;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::users::{UpdateUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
};

pub async fn list_users(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success("Users", UserList { items }, None))
}

pub async fn list_users_by_role(
    pool: &DbPool,
    user: &AuthUser,
    role: Role,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY username")
        .bind(role)
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success("Users", UserList { items }, None))
}

pub async fn get_user(
    pool: &DbPool,
    requester: &AuthUser,
    username: &str,
) -> AppResult<ApiResponse<User>> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    ensure_self_or_admin(requester, username)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(u) => Ok(ApiResponse::success("User", u, None)),
        None => Err(AppError::UserNotFound),
    }
}

pub async fn update_user(
    pool: &DbPool,
    requester: &AuthUser,
    username: &str,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    for (field, value) in [
        ("name", &payload.name),
        ("surname", &payload.surname),
        ("address", &payload.address),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    if payload.birthdate > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "birthdate must not be in the future".into(),
        ));
    }
    ensure_self_or_admin(requester, username)?;

    let target: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    let target = match target {
        Some(u) => u,
        None => return Err(AppError::UserNotFound),
    };

    // An admin account is only editable by its owner, never by another admin.
    if matches!(target.role, Role::Admin) && requester.username != target.username {
        return Err(AppError::UnauthorizedUser);
    }

    let user: User = sqlx::query_as(
        r#"
        UPDATE users
        SET name = $2, surname = $3, address = $4, birthdate = $5
        WHERE username = $1
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(payload.name)
    .bind(payload.surname)
    .bind(payload.address)
    .bind(payload.birthdate)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(&requester.username),
        "user_update",
        Some("users"),
        Some(serde_json::json!({ "username": username })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", user, Some(Meta::empty())))
}

/// Delete one account along with its carts, cart lines and reviews, in one
/// transaction.
pub async fn delete_user(
    pool: &DbPool,
    requester: &AuthUser,
    username: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    ensure_self_or_admin(requester, username)?;

    let mut txn = pool.begin().await?;

    let target: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&mut *txn)
        .await?;
    let target = match target {
        Some(u) => u,
        None => return Err(AppError::UserNotFound),
    };

    if matches!(target.role, Role::Admin) && requester.username != target.username {
        return Err(AppError::UserIsAdmin);
    }

    sqlx::query("DELETE FROM reviews WHERE username = $1")
        .bind(username)
        .execute(&mut *txn)
        .await?;
    sqlx::query(
        "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE customer = $1)",
    )
    .bind(username)
    .execute(&mut *txn)
    .await?;
    sqlx::query("DELETE FROM carts WHERE customer = $1")
        .bind(username)
        .execute(&mut *txn)
        .await?;
    sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&requester.username),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "username": username })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("User deleted"))
}

/// Bulk reset of every non-admin account. Admin rows are never touched.
pub async fn delete_all_users(
    pool: &DbPool,
    requester: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(requester)?;

    let mut txn = pool.begin().await?;

    sqlx::query(
        "DELETE FROM reviews WHERE username IN (SELECT username FROM users WHERE role <> 'Admin')",
    )
    .execute(&mut *txn)
    .await?;
    sqlx::query(
        r#"
        DELETE FROM cart_items WHERE cart_id IN (
            SELECT c.id FROM carts c
            JOIN users u ON u.username = c.customer
            WHERE u.role <> 'Admin'
        )
        "#,
    )
    .execute(&mut *txn)
    .await?;
    sqlx::query(
        "DELETE FROM carts WHERE customer IN (SELECT username FROM users WHERE role <> 'Admin')",
    )
    .execute(&mut *txn)
    .await?;
    sqlx::query("DELETE FROM users WHERE role <> 'Admin'")
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&requester.username),
        "users_delete_all",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("Non-admin users deleted"))
}
