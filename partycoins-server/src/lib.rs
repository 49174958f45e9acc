//! HTTP surface for the partycoins ledger.

pub mod config;
pub mod error;
pub mod gate;
pub mod routes;

use axum::routing::{get, post};
use axum::{middleware, Router};
use partycoins_core::Ledger;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, api_key: Option<String>) -> Self {
        Self {
            ledger,
            api_key: api_key.map(Arc::from),
        }
    }
}

/// All routes. `/health` stays outside the gate.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/register", post(routes::register))
        .route("/partyResult", post(routes::party_result))
        .route("/spend", post(routes::spend))
        .route("/coins", get(routes::coins))
        .route("/player", get(routes::player))
        .route("/events", get(routes::events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_api_key,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
