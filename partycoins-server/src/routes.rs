use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use partycoins_core::{AwardRequest, LedgerEvent, PlayerKey, PlayerRecord, RegisterRequest, SpendRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CoinsResponse {
    pub coins: i64,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub phone: Option<String>,
    pub limit: Option<usize>,
}

impl PlayerQuery {
    fn key(&self) -> Result<PlayerKey, ApiError> {
        Ok(PlayerKey::parse(self.phone.as_deref().unwrap_or_default())?)
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "partycoins-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    let cmd = req.validate()?;
    state.ledger.register(&cmd).await?;

    Ok(Json(OkResponse {
        ok: true,
        coins: None,
    }))
}

pub async fn party_result(
    State(state): State<AppState>,
    body: Result<Json<AwardRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    let cmd = req.validate()?;
    let receipt = state.ledger.award(&cmd).await?;

    Ok(Json(OkResponse {
        ok: true,
        coins: Some(receipt.balance),
    }))
}

pub async fn spend(
    State(state): State<AppState>,
    body: Result<Json<SpendRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    let cmd = req.validate()?;
    let receipt = state.ledger.spend(&cmd).await?;

    Ok(Json(OkResponse {
        ok: true,
        coins: Some(receipt.balance),
    }))
}

pub async fn coins(
    State(state): State<AppState>,
    query: Result<Query<PlayerQuery>, QueryRejection>,
) -> Result<Json<CoinsResponse>, ApiError> {
    let Query(query) = query?;
    let coins = state.ledger.balance(&query.key()?).await?;
    Ok(Json(CoinsResponse { coins }))
}

pub async fn player(
    State(state): State<AppState>,
    query: Result<Query<PlayerQuery>, QueryRejection>,
) -> Result<Json<PlayerRecord>, ApiError> {
    let Query(query) = query?;
    let key = query.key()?;
    match state.ledger.player(&key).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("player {} not found", key))),
    }
}

pub async fn events(
    State(state): State<AppState>,
    query: Result<Query<PlayerQuery>, QueryRejection>,
) -> Result<Json<EventsResponse>, ApiError> {
    let Query(query) = query?;
    let events = state.ledger.history(&query.key()?, query.limit).await?;
    Ok(Json(EventsResponse { events }))
}
