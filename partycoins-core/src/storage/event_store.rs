use crate::error::Result;
use crate::storage::{from_millis, to_millis};
use crate::types::{EventSource, LedgerEvent, PlayerKey};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

/// An event about to be appended. Identity and sequence are assigned on
/// insert.
#[derive(Debug, Clone)]
pub struct NewEvent<'k> {
    pub player_key: &'k PlayerKey,
    pub source: EventSource,
    pub amount: i64,
    pub score: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Append-only event log: rows are never updated or deleted.
pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn append(&self, event: NewEvent<'_>) -> Result<LedgerEvent> {
        let id = Uuid::new_v4();
        let source = event.source.to_string();

        self.conn.execute(
            "INSERT INTO events (id, player_key, source, amount, score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                event.player_key.as_str(),
                source,
                event.amount,
                event.score,
                to_millis(event.created_at),
            ],
        )?;

        Ok(LedgerEvent {
            id,
            seq: self.conn.last_insert_rowid(),
            player_key: event.player_key.clone(),
            source,
            amount: event.amount,
            score: event.score,
            created_at: event.created_at,
        })
    }

    /// The most recent `limit` events of a player, oldest first.
    pub fn recent_for_player(&self, key: &PlayerKey, limit: usize) -> Result<Vec<LedgerEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, id, source, amount, score, created_at
             FROM events WHERE player_key = ?1
             ORDER BY seq DESC LIMIT ?2",
        )?;

        let event_iter = stmt.query_map(params![key.as_str(), limit as i64], |row| {
            let id_str: String = row.get(1)?;
            let id = Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

            Ok(LedgerEvent {
                id,
                seq: row.get(0)?,
                player_key: key.clone(),
                source: row.get(2)?,
                amount: row.get(3)?,
                score: row.get(4)?,
                created_at: from_millis(5, row.get(5)?)?,
            })
        })?;

        let mut events = Vec::new();
        for event in event_iter {
            events.push(event?);
        }
        events.reverse();

        Ok(events)
    }

    /// Balance as derived from the log alone.
    pub fn sum_for_player(&self, key: &PlayerKey) -> Result<i64> {
        let sum = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM events WHERE player_key = ?1",
            params![key.as_str()],
            |row| row.get(0),
        )?;

        Ok(sum)
    }

    pub fn count_for_player(&self, key: &PlayerKey) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE player_key = ?1",
            params![key.as_str()],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }
}
