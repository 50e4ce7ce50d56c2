use chrono::NaiveDate;
use ezelectronics_api::{
    db::{DbPool, create_pool},
    dto::carts::AddToCartRequest,
    dto::products::RegisterProductRequest,
    dto::reviews::AddReviewRequest,
    dto::users::{CreateUserRequest, UpdateUserRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::{Category, Role},
    services::{auth_service, cart_service, product_service, review_service, user_service},
};

// Integration flow: registration, account authorization rules, the
// admin-protection rules, reviews, and the cascading deletes.
#[tokio::test]
async fn user_rules_reviews_and_cascades() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let pool = setup(&database_url).await?;

    let lucaa = admin_user(&pool, "lucaa").await?;
    let lauraa = admin_user(&pool, "lauraa").await?;
    create_user(&pool, "pallino", "Manager").await?;
    let pallino = AuthUser {
        username: "pallino".into(),
        role: Role::Manager,
    };

    // Registration round-trips; a duplicate username is a conflict and an
    // empty field is a typed validation error, not a silent one.
    auth_service::register_user(
        &pool,
        CreateUserRequest {
            username: "pincoo".into(),
            name: "Pinco".into(),
            surname: "Pallino".into(),
            password: "secret123".into(),
            role: Role::Customer,
        },
    )
    .await?;
    let pincoo = AuthUser {
        username: "pincoo".into(),
        role: Role::Customer,
    };

    let dup = auth_service::register_user(
        &pool,
        CreateUserRequest {
            username: "pincoo".into(),
            name: "Pinco".into(),
            surname: "Pallino".into(),
            password: "secret123".into(),
            role: Role::Customer,
        },
    )
    .await;
    assert!(matches!(dup, Err(AppError::UserAlreadyExists)));

    let blank = auth_service::register_user(
        &pool,
        CreateUserRequest {
            username: "someone".into(),
            name: "  ".into(),
            surname: "Pallino".into(),
            password: "secret123".into(),
            role: Role::Customer,
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    // Reads: self always, admin always, anyone else never.
    let me = user_service::get_user(&pool, &pincoo, "pincoo").await?.data.unwrap();
    assert_eq!(me.username, "pincoo");
    assert!(matches!(me.role, Role::Customer));

    let other = user_service::get_user(&pool, &pincoo, "pallino").await;
    assert!(matches!(other, Err(AppError::UserNotAdmin)));

    user_service::get_user(&pool, &lucaa, "pincoo").await?;
    let ghost = user_service::get_user(&pool, &lucaa, "nobodyy").await;
    assert!(matches!(ghost, Err(AppError::UserNotFound)));

    let customers = user_service::list_users_by_role(&pool, &lucaa, Role::Customer)
        .await?
        .data
        .unwrap();
    assert!(customers.items.iter().any(|u| u.username == "pincoo"));
    let forbidden = user_service::list_users_by_role(&pool, &pincoo, Role::Customer).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    // Updates: personal fields only, future birthdates rejected, and the
    // admin-protection rules.
    let birthdate = NaiveDate::from_ymd_opt(1999, 4, 2).unwrap();
    let updated = user_service::update_user(
        &pool,
        &lucaa,
        "pincoo",
        UpdateUserRequest {
            name: "Pinco".into(),
            surname: "Pallino".into(),
            address: "Via Roma 1".into(),
            birthdate,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.address.as_deref(), Some("Via Roma 1"));
    assert_eq!(updated.birthdate, Some(birthdate));

    let future = user_service::update_user(
        &pool,
        &pincoo,
        "pincoo",
        UpdateUserRequest {
            name: "Pinco".into(),
            surname: "Pallino".into(),
            address: "Via Roma 1".into(),
            birthdate: NaiveDate::from_ymd_opt(2999, 1, 1).unwrap(),
        },
    )
    .await;
    assert!(matches!(future, Err(AppError::Validation(_))));

    let not_admin = user_service::update_user(
        &pool,
        &pallino,
        "pincoo",
        UpdateUserRequest {
            name: "X".into(),
            surname: "Y".into(),
            address: "Z".into(),
            birthdate,
        },
    )
    .await;
    assert!(matches!(not_admin, Err(AppError::UserNotAdmin)));

    let admin_on_admin = user_service::update_user(
        &pool,
        &lucaa,
        "lauraa",
        UpdateUserRequest {
            name: "Laura".into(),
            surname: "Admin".into(),
            address: "Via Po 2".into(),
            birthdate,
        },
    )
    .await;
    assert!(matches!(admin_on_admin, Err(AppError::UnauthorizedUser)));

    // An admin may not delete another admin, only themselves.
    let delete_admin = user_service::delete_user(&pool, &lucaa, "lauraa").await;
    assert!(matches!(delete_admin, Err(AppError::UserIsAdmin)));
    let delete_other = user_service::delete_user(&pool, &pincoo, "pallino").await;
    assert!(matches!(delete_other, Err(AppError::UserNotAdmin)));

    // Reviews: one per customer and model, typed validation on score/comment.
    product_service::register_product(
        &pool,
        &pallino,
        RegisterProductRequest {
            model: "Samsung v11".into(),
            category: Category::Smartphone,
            selling_price: 500,
            details: None,
            quantity: 5,
            arrival_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        },
    )
    .await?;

    cart_service::add_product_to_cart(
        &pool,
        &pincoo,
        AddToCartRequest {
            model: "Samsung v11".into(),
        },
    )
    .await?;

    let bad_score = review_service::add_review(
        &pool,
        &pincoo,
        "Samsung v11",
        AddReviewRequest {
            score: 6,
            comment: "Too good".into(),
        },
    )
    .await;
    assert!(matches!(bad_score, Err(AppError::Validation(_))));

    let no_comment = review_service::add_review(
        &pool,
        &pincoo,
        "Samsung v11",
        AddReviewRequest {
            score: 4,
            comment: " ".into(),
        },
    )
    .await;
    assert!(matches!(no_comment, Err(AppError::Validation(_))));

    review_service::add_review(
        &pool,
        &pincoo,
        "Samsung v11",
        AddReviewRequest {
            score: 5,
            comment: "Excellent".into(),
        },
    )
    .await?;
    let twice = review_service::add_review(
        &pool,
        &pincoo,
        "Samsung v11",
        AddReviewRequest {
            score: 4,
            comment: "Second thoughts".into(),
        },
    )
    .await;
    assert!(matches!(twice, Err(AppError::ReviewAlreadyExists)));

    let reviews = review_service::list_reviews(&pool, "Samsung v11").await?.data.unwrap();
    assert_eq!(reviews.items.len(), 1);
    assert_eq!(reviews.items[0].score, 5);

    review_service::delete_review(&pool, &pincoo, "Samsung v11").await?;
    let gone = review_service::delete_review(&pool, &pincoo, "Samsung v11").await;
    assert!(matches!(gone, Err(AppError::ReviewNotFound)));

    review_service::add_review(
        &pool,
        &pincoo,
        "Samsung v11",
        AddReviewRequest {
            score: 3,
            comment: "Still fine".into(),
        },
    )
    .await?;

    // Deleting the product takes its cart lines and reviews with it.
    product_service::delete_product(&pool, &pallino, "Samsung v11").await?;

    let reviews_after = review_service::list_reviews(&pool, "Samsung v11").await;
    assert!(matches!(reviews_after, Err(AppError::ProductNotFound)));

    let orphan_lines: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE model = $1")
            .bind("Samsung v11")
            .fetch_one(&pool)
            .await?;
    assert_eq!(orphan_lines.0, 0);

    let cart = cart_service::current_cart(&pool, &pincoo).await?.data.unwrap();
    assert!(cart.products.iter().all(|p| p.model != "Samsung v11"));

    // Deleting an account twice: success, then not found. The carts go too.
    user_service::delete_user(&pool, &pincoo, "pincoo").await?;
    let twice = user_service::delete_user(&pool, &pincoo, "pincoo").await;
    assert!(matches!(twice, Err(AppError::UserNotFound)));

    let leftover_carts: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts WHERE customer = $1")
        .bind("pincoo")
        .fetch_one(&pool)
        .await?;
    assert_eq!(leftover_carts.0, 0);

    // Bulk delete spares every admin.
    user_service::delete_all_users(&pool, &lauraa).await?;
    let admins = user_service::list_users_by_role(&pool, &lucaa, Role::Admin)
        .await?
        .data
        .unwrap();
    assert!(admins.items.iter().any(|u| u.username == "lucaa"));
    assert!(admins.items.iter().any(|u| u.username == "lauraa"));
    let managers = user_service::list_users_by_role(&pool, &lucaa, Role::Manager)
        .await?
        .data
        .unwrap();
    assert!(managers.items.iter().all(|u| u.username != "pallino"));

    Ok(())
}

async fn setup(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = create_pool(database_url, 5).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Remove only this file's fixtures so the two flow binaries stay
    // independent of each other's state.
    let usernames = ["lucaa", "lauraa", "pallino", "pincoo", "someone"];
    let models = ["Samsung v11"];

    sqlx::query("DELETE FROM reviews WHERE username = ANY($1) OR model = ANY($2)")
        .bind(usernames.as_slice())
        .bind(models.as_slice())
        .execute(&pool)
        .await?;
    sqlx::query(
        "DELETE FROM cart_items WHERE model = ANY($2) OR cart_id IN (SELECT id FROM carts WHERE customer = ANY($1))",
    )
    .bind(usernames.as_slice())
    .bind(models.as_slice())
    .execute(&pool)
    .await?;
    sqlx::query("DELETE FROM carts WHERE customer = ANY($1)")
        .bind(usernames.as_slice())
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM products WHERE model = ANY($1)")
        .bind(models.as_slice())
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM users WHERE username = ANY($1)")
        .bind(usernames.as_slice())
        .execute(&pool)
        .await?;

    Ok(pool)
}

async fn create_user(pool: &DbPool, username: &str, role: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (username, name, surname, role, password_hash)
        VALUES ($1, $1, $1, $2::user_role, 'dummy')
        "#,
    )
    .bind(username)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(())
}

async fn admin_user(pool: &DbPool, username: &str) -> anyhow::Result<AuthUser> {
    create_user(pool, username, "Admin").await?;
    Ok(AuthUser {
        username: username.into(),
        role: Role::Admin,
    })
}
