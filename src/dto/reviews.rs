use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProductReview;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReviewRequest {
    pub score: i32,
    pub comment: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<ProductReview>,
}
