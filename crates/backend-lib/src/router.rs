// ============================
// santhe-backend-lib/src/router.rs
// ============================
//! HTTP routes of the user service.
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{auth, system, users};
use crate::middleware::{optional_subject, require_admin, require_auth};
use crate::AppState;

/// Create the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    let authenticated = || from_fn_with_state(state.clone(), require_auth);

    let me = Router::new()
        .route("/api/users/me", get(users::get_me).patch(users::update_me))
        .route_layer(authenticated());

    let mut admin_register =
        Router::new().route("/api/users/admin-register", post(users::admin_register));
    if state.settings.auth.admin_register_requires_admin {
        admin_register = admin_register
            .route_layer(from_fn(require_admin))
            .route_layer(authenticated());
    }

    let mut role_update = Router::new().route("/api/users/{id}/role", patch(users::update_role));
    if state.settings.auth.role_update_requires_admin {
        role_update = role_update
            .route_layer(from_fn(require_admin))
            .route_layer(authenticated());
    }

    let logout = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), optional_subject));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/roles", get(system::list_roles))
        .route("/api/password/forgot", post(system::forgot_password))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/register", post(users::register))
        .route("/api/users/{id}", get(users::get_user))
        .merge(me)
        .merge(admin_register)
        .merge(role_update)
        .merge(logout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
