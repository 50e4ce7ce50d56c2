use chrono::Utc;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{ProductList, QuantityResponse, RegisterProductRequest, RestockRequest, SellRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin_or_manager},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{Grouping, ProductQuery},
};

pub async fn register_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: RegisterProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin_or_manager(user)?;

    if payload.model.trim().is_empty() {
        return Err(AppError::Validation("model must not be empty".into()));
    }
    if payload.selling_price <= 0 {
        return Err(AppError::Validation(
            "selling_price must be greater than 0".into(),
        ));
    }
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let today = Utc::now().date_naive();
    let arrival_date = payload.arrival_date.unwrap_or(today);
    if arrival_date > today {
        return Err(AppError::DateError);
    }

    let exist: Option<(String,)> = sqlx::query_as("SELECT model FROM products WHERE model = $1")
        .bind(payload.model.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::ProductAlreadyExists);
    }

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (model, category, selling_price, details, quantity, arrival_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(payload.model.as_str())
    .bind(payload.category)
    .bind(payload.selling_price)
    .bind(payload.details)
    .bind(payload.quantity)
    .bind(arrival_date)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "product_register",
        Some("products"),
        Some(serde_json::json!({ "model": product.model, "quantity": product.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product registered",
        product,
        Some(Meta::empty()),
    ))
}

/// Restock: new arrivals increase the stored quantity. The change date may
/// not precede the product's arrival date, nor lie in the future.
pub async fn increase_quantity(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
    payload: RestockRequest,
) -> AppResult<ApiResponse<QuantityResponse>> {
    ensure_admin_or_manager(user)?;

    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let mut txn = pool.begin().await?;

    let product: Option<Product> =
        sqlx::query_as("SELECT * FROM products WHERE model = $1 FOR UPDATE")
            .bind(model)
            .fetch_optional(&mut *txn)
            .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::ProductNotFound),
    };

    let today = Utc::now().date_naive();
    let change_date = payload.change_date.unwrap_or(today);
    if change_date > today || change_date < product.arrival_date {
        return Err(AppError::DateError);
    }

    let (quantity,): (i32,) = sqlx::query_as(
        "UPDATE products SET quantity = quantity + $2 WHERE model = $1 RETURNING quantity",
    )
    .bind(model)
    .bind(payload.quantity)
    .fetch_one(&mut *txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "product_restock",
        Some("products"),
        Some(serde_json::json!({ "model": model, "delta": payload.quantity, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Quantity increased",
        QuantityResponse { quantity },
        Some(Meta::empty()),
    ))
}

/// Direct sale outside a cart. Stock checks are strict: a product at zero is
/// out of stock even for a zero-ish request, and the requested quantity must
/// not exceed what is stored.
pub async fn sell_product(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
    payload: SellRequest,
) -> AppResult<ApiResponse<QuantityResponse>> {
    ensure_admin_or_manager(user)?;

    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let mut txn = pool.begin().await?;

    let product: Option<Product> =
        sqlx::query_as("SELECT * FROM products WHERE model = $1 FOR UPDATE")
            .bind(model)
            .fetch_optional(&mut *txn)
            .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::ProductNotFound),
    };

    let today = Utc::now().date_naive();
    let selling_date = payload.selling_date.unwrap_or(today);
    if selling_date > today || selling_date < product.arrival_date {
        return Err(AppError::DateError);
    }

    if product.quantity == 0 {
        return Err(AppError::EmptyProductStock);
    }
    if payload.quantity > product.quantity {
        return Err(AppError::LowProductStock);
    }

    let (quantity,): (i32,) = sqlx::query_as(
        "UPDATE products SET quantity = quantity - $2 WHERE model = $1 RETURNING quantity",
    )
    .bind(model)
    .bind(payload.quantity)
    .fetch_one(&mut *txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "product_sell",
        Some("products"),
        Some(serde_json::json!({ "model": model, "delta": payload.quantity, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product sold",
        QuantityResponse { quantity },
        Some(Meta::empty()),
    ))
}

/// Grouped catalog read. A model lookup that matches nothing is an error; a
/// category lookup that matches nothing is an empty list.
pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
    available_only: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let items: Vec<Product> = match query.grouping {
        None => {
            if query.category.is_some() || query.model.is_some() {
                return Err(AppError::Validation(
                    "category and model require a grouping".into(),
                ));
            }
            let sql = if available_only {
                "SELECT * FROM products WHERE quantity > 0 ORDER BY model"
            } else {
                "SELECT * FROM products ORDER BY model"
            };
            sqlx::query_as(sql).fetch_all(pool).await?
        }
        Some(Grouping::Category) => {
            let category = match (query.category, query.model) {
                (Some(c), None) => c,
                _ => {
                    return Err(AppError::Validation(
                        "grouping=category requires category and no model".into(),
                    ));
                }
            };
            let sql = if available_only {
                "SELECT * FROM products WHERE category = $1 AND quantity > 0 ORDER BY model"
            } else {
                "SELECT * FROM products WHERE category = $1 ORDER BY model"
            };
            sqlx::query_as(sql).bind(category).fetch_all(pool).await?
        }
        Some(Grouping::Model) => {
            let model = match (query.model, query.category) {
                (Some(m), None) if !m.trim().is_empty() => m,
                _ => {
                    return Err(AppError::Validation(
                        "grouping=model requires model and no category".into(),
                    ));
                }
            };
            let sql = if available_only {
                "SELECT * FROM products WHERE model = $1 AND quantity > 0 ORDER BY model"
            } else {
                "SELECT * FROM products WHERE model = $1 ORDER BY model"
            };
            let rows: Vec<Product> = sqlx::query_as(sql).bind(model).fetch_all(pool).await?;
            if rows.is_empty() {
                return Err(AppError::ProductNotFound);
            }
            rows
        }
    };

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        None,
    ))
}

/// Remove one product and every row that references it (cart lines, then
/// reviews), all in one transaction.
pub async fn delete_product(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin_or_manager(user)?;

    let mut txn = pool.begin().await?;

    let result = sqlx::query("DELETE FROM products WHERE model = $1")
        .bind(model)
        .execute(&mut *txn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound);
    }

    sqlx::query("DELETE FROM cart_items WHERE model = $1")
        .bind(model)
        .execute(&mut *txn)
        .await?;
    sqlx::query("DELETE FROM reviews WHERE model = $1")
        .bind(model)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "model": model })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("Product deleted"))
}

/// Full catalog reset: products, cart lines and reviews all go, atomically.
pub async fn delete_all_products(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin_or_manager(user)?;

    let mut txn = pool.begin().await?;

    sqlx::query("DELETE FROM products").execute(&mut *txn).await?;
    sqlx::query("DELETE FROM cart_items").execute(&mut *txn).await?;
    sqlx::query("DELETE FROM reviews").execute(&mut *txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "products_delete_all",
        Some("products"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("All products deleted"))
}
