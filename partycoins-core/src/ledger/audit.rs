use crate::error::Result;
use crate::storage::{EventStore, PlayerStore};
use crate::types::PlayerKey;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMismatch {
    pub key: PlayerKey,
    /// Balance on the player row.
    pub recorded: i64,
    /// Sum of the player's events.
    pub derived: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub players_checked: usize,
    pub events_checked: u64,
    pub mismatches: Vec<AuditMismatch>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub(crate) fn run(conn: &Connection, key: Option<&PlayerKey>) -> Result<AuditReport> {
    let players = PlayerStore::new(conn);
    let events = EventStore::new(conn);

    let keys = match key {
        Some(key) => vec![key.clone()],
        None => players.list_keys()?,
    };

    let mut report = AuditReport::default();
    for key in keys {
        // unknown players audit as an empty ledger
        let recorded = players.coins(&key)?.unwrap_or(0);
        let derived = events.sum_for_player(&key)?;

        report.players_checked += 1;
        report.events_checked += events.count_for_player(&key)?;
        if recorded != derived {
            report.mismatches.push(AuditMismatch {
                key,
                recorded,
                derived,
            });
        }
    }

    Ok(report)
}
