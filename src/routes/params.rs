use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Category;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Category,
    Model,
}

/// Catalog filter. `category`/`model` are only meaningful under the matching
/// `grouping`; the service rejects mismatched combinations.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub grouping: Option<Grouping>,
    pub category: Option<Category>,
    pub model: Option<String>,
}
