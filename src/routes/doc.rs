use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        carts::{AddToCartRequest, CartDto, CartList, CheckoutRequest},
        products::{
            ProductList, QuantityResponse, RegisterProductRequest, RestockRequest, SellRequest,
        },
        reviews::{AddReviewRequest, ReviewList},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    models::{Cart, Category, Product, ProductInCart, ProductReview, Role, User},
    response::{ApiResponse, Meta},
    routes::{carts, health, params, products, reviews, sessions, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::list_users,
        users::list_users_by_role,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::delete_all_users,
        sessions::login,
        sessions::current,
        sessions::logout,
        products::register_product,
        products::restock_product,
        products::sell_product,
        products::list_products,
        products::list_available_products,
        products::delete_product,
        products::delete_all_products,
        carts::current_cart,
        carts::add_to_cart,
        carts::checkout,
        carts::history,
        carts::remove_from_cart,
        carts::clear_current_cart,
        carts::list_all_carts,
        carts::delete_all_carts,
        reviews::add_review,
        reviews::list_reviews,
        reviews::delete_review,
        reviews::delete_reviews_of_product,
        reviews::delete_all_reviews
    ),
    components(
        schemas(
            Role,
            Category,
            User,
            Product,
            Cart,
            ProductInCart,
            ProductReview,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            LoginRequest,
            LoginResponse,
            RegisterProductRequest,
            RestockRequest,
            SellRequest,
            QuantityResponse,
            ProductList,
            AddToCartRequest,
            CheckoutRequest,
            CartDto,
            CartList,
            AddReviewRequest,
            ReviewList,
            params::ProductQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartDto>,
            ApiResponse<CartList>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Account registration and management"),
        (name = "Sessions", description = "Login and current session"),
        (name = "Products", description = "Catalog and stock"),
        (name = "Carts", description = "Current cart, checkout, history"),
        (name = "Reviews", description = "Product reviews"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
