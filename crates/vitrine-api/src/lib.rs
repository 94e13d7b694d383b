pub mod auth;
pub mod authz;
pub mod cache;
pub mod categories;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod moderation;
pub mod products;
pub mod profile;
pub mod tokens;
pub mod validation;
pub mod versions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::AppState;

/// The full route table. Public routes are reachable without a token; the
/// protected set sits behind the bearer-JWT guard.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify/{uid}/{token}", get(auth::verify_email))
        .route("/auth/password-reset", post(auth::password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::password_reset_confirm),
        )
        .route("/products", get(products::list_products))
        .route("/categories", get(categories::list_categories))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/{id}/versions", post(versions::create_version))
        .route(
            "/versions/{id}",
            get(versions::get_version).put(versions::update_version),
        )
        .route("/categories", post(categories::create_category))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    public_routes.merge(protected_routes)
}
