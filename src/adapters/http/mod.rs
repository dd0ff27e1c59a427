//! HTTP adapters - REST API implementations.
//!
//! Each module has its own router; `api_router` merges them under `/api`
//! behind the bearer-token middleware. Webhook routes carry no bearer token
//! and pass through the middleware untouched.

pub mod billing;
pub mod error;
pub mod generation;
pub mod health;
pub mod middleware;

use axum::Router;

pub use billing::{billing_routes, BillingAppState};
pub use error::ErrorResponse;
pub use generation::{generation_routes, GenerationAppState};
pub use health::health_routes;
pub use middleware::{auth_middleware, AuthState, RequireAuth};

/// Complete application router without outer tower layers.
pub fn api_router(billing: BillingAppState, generation: GenerationAppState, auth: AuthState) -> Router {
    let api = Router::new()
        .merge(billing_routes().with_state(billing))
        .merge(generation_routes().with_state(generation));

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
        .merge(health_routes())
}
