//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Accounts & auth
//! POST   /api/users                    - Register
//! GET    /api/users/{id}               - Fetch a user (auth)
//! POST   /api/auth/login               - Login, returns a bearer token
//! POST   /api/auth/password/reset      - Issue a reset token by email
//! POST   /api/auth/password/validate   - Validate a reset token
//! POST   /api/auth/password/change     - Change password after validation
//!
//! # Catalog
//! GET    /api/products                 - Product listing
//! GET    /api/products/{id}            - Product detail
//! POST   /api/products                 - Create product (auth)
//! PUT    /api/products/{id}            - Update product (auth, creator only)
//! DELETE /api/products/{id}            - Delete product (auth, creator only)
//! POST   /api/uploads                  - Upload a product image (auth)
//!
//! # Cart & checkout (all auth)
//! GET    /api/cart                     - Resolved cart
//! POST   /api/cart/items               - Add one unit of a product
//! DELETE /api/cart/items/{productId}   - Remove an item entirely
//! POST   /api/cart/clear               - Empty the cart
//! POST   /api/checkout                 - Run the checkout sequence
//! GET    /api/orders                   - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Build the API router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        // Accounts & auth
        .route("/api/users", post(auth::register))
        .route("/api/users/{id}", get(auth::get_user))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/password/reset", post(auth::reset_password))
        .route("/api/auth/password/validate", post(auth::validate_token))
        .route("/api/auth/password/change", post(auth::change_password))
        // Catalog
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route("/api/uploads", post(uploads::upload))
        // Cart & checkout
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route("/api/cart/items/{product_id}", delete(cart::remove_item))
        .route("/api/cart/clear", post(cart::clear))
        .route("/api/checkout", post(orders::checkout))
        .route("/api/orders", get(orders::list))
}
