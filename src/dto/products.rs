use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterProductRequest {
    pub model: String,
    pub category: Category,
    /// Unit price in cents.
    pub selling_price: i64,
    pub details: Option<String>,
    pub quantity: i32,
    /// Defaults to today when omitted.
    pub arrival_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub quantity: i32,
    pub change_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SellRequest {
    pub quantity: i32,
    pub selling_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuantityResponse {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
