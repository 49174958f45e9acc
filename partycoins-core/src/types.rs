use crate::error::{LedgerError, Result};
use crate::phone::normalize_phone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Canonical player identity: a normalized phone number with at least one
/// digit. The only way to address a player record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerKey(String);

impl PlayerKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let key = normalize_phone(raw);
        if !key.chars().any(|c| c.is_ascii_digit()) {
            return Err(LedgerError::invalid_input("phone is required"));
        }
        Ok(Self(key))
    }

    /// Keys read back from the database were normalized on the way in.
    pub(crate) fn from_stored(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerKey {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<PlayerKey> for String {
    fn from(key: PlayerKey) -> Self {
        key.0
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyScore {
    pub last_score: i64,
    pub best_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub key: PlayerKey,
    pub name: String,
    pub coins: i64,
    pub party_scores: BTreeMap<String, PartyScore>,
    pub last_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What caused a mutation. Rendered into the `source` tag stored on the
/// player record and its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Registration,
    Party(String),
    Spend,
    Reason(String),
}

impl EventSource {
    /// Source for a spend: the caller's reason, or plain `spend`.
    pub fn for_spend(reason: Option<&str>) -> Self {
        match reason.map(str::trim) {
            Some(r) if !r.is_empty() => Self::Reason(r.to_string()),
            _ => Self::Spend,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => f.write_str("registration"),
            Self::Party(game_id) => write!(f, "party:{}", game_id),
            Self::Spend => f.write_str("spend"),
            Self::Reason(reason) => f.write_str(reason),
        }
    }
}

/// One committed balance change. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub id: Uuid,
    pub seq: i64,
    pub player_key: PlayerKey,
    pub source: String,
    pub amount: i64, // +ve credit, -ve debit
    pub score: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a committed award or spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub event_id: Uuid,
    pub balance: i64,
}
