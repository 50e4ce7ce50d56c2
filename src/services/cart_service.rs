use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::carts::{AddToCartRequest, CartDto, CartList, CheckoutRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin_or_manager, ensure_customer},
    models::{Cart, Product, ProductInCart},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CheckoutLine {
    model: String,
    quantity: i32,
    stock: i32,
}

/// Line items with category and unit price joined in from the product rows.
async fn cart_products(pool: &DbPool, cart_id: Uuid) -> AppResult<Vec<ProductInCart>> {
    let items = sqlx::query_as::<_, ProductInCart>(
        r#"
        SELECT ci.model, ci.quantity, p.category, p.selling_price AS price
        FROM cart_items ci
        JOIN products p ON p.model = ci.model
        WHERE ci.cart_id = $1
        ORDER BY ci.model
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

async fn hydrate(pool: &DbPool, cart: Cart) -> AppResult<CartDto> {
    let products = cart_products(pool, cart.id).await?;
    Ok(CartDto::from_row(cart, products))
}

/// The customer's in-progress cart. A customer with no unpaid cart row gets
/// an empty cart back, never an error.
pub async fn current_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartDto>> {
    ensure_customer(user)?;

    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE customer = $1 AND NOT paid")
            .bind(user.username.as_str())
            .fetch_optional(pool)
            .await?;

    let dto = match cart {
        Some(cart) => hydrate(pool, cart).await?,
        None => CartDto::empty(&user.username),
    };

    Ok(ApiResponse::success("Current cart", dto, None))
}

/// Add one unit of a model to the current cart, creating the cart lazily on
/// the first add. Stock is only checked for presence here; it is not
/// decremented until checkout.
pub async fn add_product_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartDto>> {
    ensure_customer(user)?;

    if payload.model.trim().is_empty() {
        return Err(AppError::Validation("model must not be empty".into()));
    }

    let mut txn = pool.begin().await?;

    let product: Option<Product> =
        sqlx::query_as("SELECT * FROM products WHERE model = $1 FOR UPDATE")
            .bind(payload.model.as_str())
            .fetch_optional(&mut *txn)
            .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::ProductNotFound),
    };
    if product.quantity == 0 {
        return Err(AppError::EmptyProductStock);
    }

    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE customer = $1 AND NOT paid FOR UPDATE")
            .bind(user.username.as_str())
            .fetch_optional(&mut *txn)
            .await?;

    let cart_id = match cart {
        None => {
            let cart_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO carts (id, customer, paid, total) VALUES ($1, $2, FALSE, $3)",
            )
            .bind(cart_id)
            .bind(user.username.as_str())
            .bind(product.selling_price)
            .execute(&mut *txn)
            .await?;
            sqlx::query("INSERT INTO cart_items (cart_id, model, quantity) VALUES ($1, $2, 1)")
                .bind(cart_id)
                .bind(product.model.as_str())
                .execute(&mut *txn)
                .await?;
            cart_id
        }
        Some(cart) => {
            sqlx::query("UPDATE carts SET total = total + $2 WHERE id = $1")
                .bind(cart.id)
                .bind(product.selling_price)
                .execute(&mut *txn)
                .await?;
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_id, model, quantity)
                VALUES ($1, $2, 1)
                ON CONFLICT (cart_id, model)
                DO UPDATE SET quantity = cart_items.quantity + 1
                "#,
            )
            .bind(cart.id)
            .bind(product.model.as_str())
            .execute(&mut *txn)
            .await?;
            cart.id
        }
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "cart_add",
        Some("carts"),
        Some(serde_json::json!({ "model": product.model })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(pool)
        .await?;
    let dto = hydrate(pool, cart).await?;

    Ok(ApiResponse::success("Added to cart", dto, None))
}

/// Checkout. Every line is re-validated against live, locked stock before
/// anything is written; only after all lines pass is the cart marked paid
/// and each product decremented by its line quantity.
pub async fn checkout(
    pool: &DbPool,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CartDto>> {
    ensure_customer(user)?;

    let today = Utc::now().date_naive();
    let payment_date = payload.payment_date.unwrap_or(today);
    if payment_date > today {
        return Err(AppError::DateError);
    }

    let mut txn = pool.begin().await?;

    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE customer = $1 AND NOT paid FOR UPDATE")
            .bind(user.username.as_str())
            .fetch_optional(&mut *txn)
            .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::CartNotFound),
    };

    let lines: Vec<CheckoutLine> = sqlx::query_as(
        r#"
        SELECT ci.model, ci.quantity, p.quantity AS stock
        FROM cart_items ci
        JOIN products p ON p.model = ci.model
        WHERE ci.cart_id = $1
        ORDER BY ci.model
        FOR UPDATE OF p
        "#,
    )
    .bind(cart.id)
    .fetch_all(&mut *txn)
    .await?;

    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    for line in &lines {
        if line.stock == 0 {
            return Err(AppError::EmptyProductStock);
        }
        if line.stock < line.quantity {
            return Err(AppError::LowProductStock);
        }
    }

    sqlx::query("UPDATE carts SET paid = TRUE, payment_date = $2 WHERE id = $1")
        .bind(cart.id)
        .bind(payment_date)
        .execute(&mut *txn)
        .await?;

    for line in &lines {
        sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE model = $1")
            .bind(line.model.as_str())
            .bind(line.quantity)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "cart_checkout",
        Some("carts"),
        Some(serde_json::json!({ "cart_id": cart.id, "total": cart.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1")
        .bind(cart.id)
        .fetch_one(pool)
        .await?;
    let dto = hydrate(pool, cart).await?;

    Ok(ApiResponse::success("Cart paid", dto, Some(Meta::empty())))
}

/// All paid carts of the customer, each with its line items.
pub async fn history(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    ensure_customer(user)?;

    let carts: Vec<Cart> = sqlx::query_as(
        "SELECT * FROM carts WHERE customer = $1 AND paid ORDER BY payment_date, id",
    )
    .bind(user.username.as_str())
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(carts.len());
    for cart in carts {
        items.push(hydrate(pool, cart).await?);
    }

    Ok(ApiResponse::success("Cart history", CartList { items }, None))
}

/// Remove one unit of a model from the current cart.
pub async fn remove_product_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    model: &str,
) -> AppResult<ApiResponse<CartDto>> {
    ensure_customer(user)?;

    let mut txn = pool.begin().await?;

    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE customer = $1 AND NOT paid FOR UPDATE")
            .bind(user.username.as_str())
            .fetch_optional(&mut *txn)
            .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::CartNotFound),
    };

    let price: Option<(i64,)> = sqlx::query_as("SELECT selling_price FROM products WHERE model = $1")
        .bind(model)
        .fetch_optional(&mut *txn)
        .await?;
    let (price,) = match price {
        Some(p) => p,
        None => return Err(AppError::ProductNotFound),
    };

    let line: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE cart_id = $1 AND model = $2")
            .bind(cart.id)
            .bind(model)
            .fetch_optional(&mut *txn)
            .await?;
    let (line_quantity,) = match line {
        Some(q) => q,
        None => return Err(AppError::ProductNotInCart),
    };

    sqlx::query("UPDATE carts SET total = total - $2 WHERE id = $1")
        .bind(cart.id)
        .bind(price)
        .execute(&mut *txn)
        .await?;

    if line_quantity == 1 {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND model = $2")
            .bind(cart.id)
            .bind(model)
            .execute(&mut *txn)
            .await?;
    } else {
        sqlx::query(
            "UPDATE cart_items SET quantity = quantity - 1 WHERE cart_id = $1 AND model = $2",
        )
        .bind(cart.id)
        .bind(model)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "cart_remove",
        Some("carts"),
        Some(serde_json::json!({ "model": model })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1")
        .bind(cart.id)
        .fetch_one(pool)
        .await?;
    let dto = hydrate(pool, cart).await?;

    Ok(ApiResponse::success("Removed from cart", dto, None))
}

/// Empty the current cart. The cart row survives with a zero total.
pub async fn clear_current_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;

    let mut txn = pool.begin().await?;

    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE customer = $1 AND NOT paid FOR UPDATE")
            .bind(user.username.as_str())
            .fetch_optional(&mut *txn)
            .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::CartNotFound),
    };

    sqlx::query("UPDATE carts SET total = 0 WHERE id = $1")
        .bind(cart.id)
        .execute(&mut *txn)
        .await?;
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "cart_clear",
        Some("carts"),
        Some(serde_json::json!({ "cart_id": cart.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("Cart emptied"))
}

/// Every cart in the store, current and historical.
pub async fn list_all_carts(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    ensure_admin_or_manager(user)?;

    let carts: Vec<Cart> = sqlx::query_as("SELECT * FROM carts ORDER BY customer, created_at")
        .fetch_all(pool)
        .await?;

    let mut items = Vec::with_capacity(carts.len());
    for cart in carts {
        items.push(hydrate(pool, cart).await?);
    }

    Ok(ApiResponse::success("All carts", CartList { items }, None))
}

pub async fn delete_all_carts(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin_or_manager(user)?;

    let mut txn = pool.begin().await?;

    sqlx::query("DELETE FROM cart_items").execute(&mut *txn).await?;
    sqlx::query("DELETE FROM carts").execute(&mut *txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(&user.username),
        "carts_delete_all",
        Some("carts"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledged("All carts deleted"))
}
