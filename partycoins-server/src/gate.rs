//! Shared-secret gate in front of the ledger routes.

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

/// Let the request through when no secret is configured, or when either the
/// `x-api-key` header or the `key` query parameter matches it. Both are
/// checked, so a stale header does not mask a valid query key.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    if request_carries_key(&req, expected) {
        next.run(req).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}

fn request_carries_key(req: &Request, expected: &str) -> bool {
    let header_ok = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| secrets_match(provided.as_bytes(), expected.as_bytes()));

    let query_ok = Query::<KeyQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.key)
        .is_some_and(|provided| secrets_match(provided.as_bytes(), expected.as_bytes()));

    header_ok || query_ok
}

fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    bool::from(provided.ct_eq(expected))
}
