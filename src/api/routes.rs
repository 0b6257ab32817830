use crate::api::handlers::{auth, users};
use crate::auth::middleware::auth_middleware;
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Routes mounted under `/api`.
pub fn create_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::me))
        // User administration
        .route("/usuarios/listUsers", get(users::list_users))
        .route("/usuarios/addUser", post(users::add_user))
        .route("/usuarios/getUser/{id}", get(users::get_user))
        .route("/usuarios/updateUser/{id}", put(users::update_user))
        .route("/usuarios/deleteUser/{id}", delete(users::delete_user))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(protected_routes)
}

/// The complete application: `/health`, the API under `/api`, request
/// tracing and CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_router(state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
