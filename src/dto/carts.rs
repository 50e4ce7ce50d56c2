use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Cart, ProductInCart};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub model: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Defaults to today when omitted.
    pub payment_date: Option<NaiveDate>,
}

/// A cart as the API reports it: the stored row plus its hydrated lines.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartDto {
    pub customer: String,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub total: i64,
    pub products: Vec<ProductInCart>,
}

impl CartDto {
    pub fn from_row(cart: Cart, products: Vec<ProductInCart>) -> Self {
        Self {
            customer: cart.customer,
            paid: cart.paid,
            payment_date: cart.payment_date,
            total: cart.total,
            products,
        }
    }

    /// The cart a customer "has" before any add: never an error, just empty.
    pub fn empty(customer: &str) -> Self {
        Self {
            customer: customer.to_string(),
            paid: false,
            payment_date: None,
            total: 0,
            products: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartDto>,
}
