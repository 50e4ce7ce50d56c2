use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed set of account roles. Authorization decisions match on this
/// exhaustively; the role string from the wire is parsed once, at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    Customer,
    Manager,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Manager" => Ok(Role::Manager),
            "Admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Customer => "Customer",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_category")]
pub enum Category {
    Smartphone,
    Laptop,
    Appliance,
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Smartphone" => Ok(Category::Smartphone),
            "Laptop" => Ok(Category::Laptop),
            "Appliance" => Ok(Category::Appliance),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Smartphone => "Smartphone",
            Category::Laptop => "Laptop",
            Category::Appliance => "Appliance",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub role: Role,
    pub address: Option<String>,
    pub birthdate: Option<NaiveDate>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub model: String,
    pub category: Category,
    /// Unit price in cents.
    pub selling_price: i64,
    pub details: Option<String>,
    pub quantity: i32,
    pub arrival_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A cart row as stored; line items are hydrated separately.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub customer: String,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub total: i64,
}

/// One (cart, model) line. Category and unit price come from the product
/// row at read time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProductInCart {
    pub model: String,
    pub quantity: i32,
    pub category: Category,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProductReview {
    pub model: String,
    pub username: String,
    pub score: i32,
    pub date: NaiveDate,
    pub comment: String,
}
