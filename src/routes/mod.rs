use axum::Router;

use crate::db::DbPool;

pub mod carts;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod reviews;
pub mod sessions;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<DbPool> {
    Router::new()
        .nest("/users", users::router())
        .nest("/sessions", sessions::router())
        .nest("/products", products::router())
        .nest("/carts", carts::router())
        .nest("/reviews", reviews::router())
}
