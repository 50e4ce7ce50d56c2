use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::NaiveDate;
use ezelectronics_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

// Fixture order matters: users first, then the catalog, then carts and
// reviews that reference both.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_users(&pool).await?;
    seed_products(&pool).await?;
    seed_cart(&pool).await?;
    seed_reviews(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_users(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let users = vec![
        ("lucaa", "Luca", "Bianchi", "Admin", "admin123"),
        ("marioo", "Mario", "Rossi", "Manager", "manager123"),
        ("erikaa", "Erika", "Verdi", "Customer", "customer123"),
        ("giannii", "Gianni", "Neri", "Customer", "customer123"),
    ];

    for (username, name, surname, role, password) in users {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .to_string();

        sqlx::query(
            r#"
            INSERT INTO users (username, name, surname, role, password_hash)
            VALUES ($1, $2, $3, $4::user_role, $5)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(name)
        .bind(surname)
        .bind(role)
        .bind(password_hash)
        .execute(pool)
        .await?;

        println!("Ensured user {username} (role={role})");
    }

    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let arrival = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let products = vec![
        ("Hp v10", "Laptop", 300_i64, "14-inch ultrabook", 10),
        ("Huawei v20", "Smartphone", 200, "Dual-sim", 10),
        ("Samsung s20", "Smartphone", 500, "128 GB", 5),
        ("LG fridge", "Appliance", 900, "No-frost", 3),
    ];

    for (model, category, price, details, quantity) in products {
        sqlx::query(
            r#"
            INSERT INTO products (model, category, selling_price, details, quantity, arrival_date)
            VALUES ($1, $2::product_category, $3, $4, $5, $6)
            ON CONFLICT (model) DO NOTHING
            "#,
        )
        .bind(model)
        .bind(category)
        .bind(price)
        .bind(details)
        .bind(quantity)
        .bind(arrival)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_cart(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM carts WHERE customer = $1 AND NOT paid")
            .bind("erikaa")
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Ok(());
    }

    let cart_id = Uuid::new_v4();
    sqlx::query("INSERT INTO carts (id, customer, paid, total) VALUES ($1, 'erikaa', FALSE, 500)")
        .bind(cart_id)
        .execute(pool)
        .await?;
    for model in ["Hp v10", "Huawei v20"] {
        sqlx::query("INSERT INTO cart_items (cart_id, model, quantity) VALUES ($1, $2, 1)")
            .bind(cart_id)
            .bind(model)
            .execute(pool)
            .await?;
    }

    println!("Seeded cart for erikaa");
    Ok(())
}

async fn seed_reviews(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let date = NaiveDate::from_ymd_opt(2024, 5, 28).unwrap();
    let reviews = vec![
        ("Samsung s20", "erikaa", 5, "Great screen"),
        ("Hp v10", "giannii", 4, "Solid for the price"),
    ];

    for (model, username, score, comment) in reviews {
        sqlx::query(
            r#"
            INSERT INTO reviews (model, username, score, date, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (model, username) DO NOTHING
            "#,
        )
        .bind(model)
        .bind(username)
        .bind(score)
        .bind(date)
        .bind(comment)
        .execute(pool)
        .await?;
    }

    println!("Seeded reviews");
    Ok(())
}
