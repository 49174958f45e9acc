//! Loosely-typed inbound requests and the validated commands the ledger runs.
//!
//! Request structs mirror the JSON bodies clients send: every field is
//! optional so a missing field becomes an `InvalidInput` rejection instead
//! of a deserialization failure. `validate()` applies the defaults and turns
//! them into commands.

use crate::error::{LedgerError, Result};
use crate::types::PlayerKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub coins: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub key: PlayerKey,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub key: PlayerKey,
    pub game_id: String,
    pub score: i64,
    pub coins: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    pub key: PlayerKey,
    pub amount: i64,
    pub reason: Option<String>,
}

fn require_key(phone: Option<&str>) -> Result<PlayerKey> {
    PlayerKey::parse(phone.unwrap_or_default())
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<Registration> {
        Ok(Registration {
            key: require_key(self.phone.as_deref())?,
            name: self.name.clone().unwrap_or_default(),
        })
    }
}

impl AwardRequest {
    pub fn validate(&self) -> Result<Award> {
        let key = require_key(self.phone.as_deref())?;

        let game_id = self
            .game_id
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| LedgerError::invalid_input("gameId is required"))?;

        let coins = self.coins.unwrap_or(0);
        if coins < 0 {
            return Err(LedgerError::invalid_input("coins must not be negative"));
        }

        Ok(Award {
            key,
            game_id: game_id.to_string(),
            score: self.score.unwrap_or(0),
            coins,
        })
    }
}

impl SpendRequest {
    pub fn validate(&self) -> Result<Spend> {
        let key = require_key(self.phone.as_deref())?;

        let amount = match self.amount {
            Some(amount) if amount > 0 => amount,
            Some(_) => return Err(LedgerError::invalid_input("amount must be positive")),
            None => return Err(LedgerError::invalid_input("amount is required")),
        };

        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Spend {
            key,
            amount,
            reason,
        })
    }
}
