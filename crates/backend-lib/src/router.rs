// ============================
// accounts-backend-lib/src/router.rs
// ============================
//! HTTP router for the accounts server.
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::require_auth;
use crate::AppState;

/// Create the router with public auth routes and bearer-protected user routes
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/sign-up", post(handlers::sign_up))
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/refresh", get(handlers::refresh))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TimeoutLayer::new(state.settings.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
