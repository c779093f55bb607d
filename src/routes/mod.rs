use axum::Router;

use crate::state::SharedState;

/// Review and lifecycle endpoints behind the reviewer token.
pub mod admin;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Liveness endpoint.
pub mod health;
/// Read-only match and result endpoints.
pub mod public;
/// Draft endpoints for the two scorekeepers.
pub mod scorekeeper;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(public::router())
        .merge(scorekeeper::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
