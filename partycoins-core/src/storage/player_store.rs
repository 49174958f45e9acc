use crate::error::Result;
use crate::storage::{from_millis, to_millis};
use crate::types::{EventSource, PartyScore, PlayerKey, PlayerRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Player rows and their per-game scores. Works on a plain connection or,
/// through deref, on an open transaction.
pub struct PlayerStore<'a> {
    conn: &'a Connection,
}

impl<'a> PlayerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn coins(&self, key: &PlayerKey) -> Result<Option<i64>> {
        let coins = self
            .conn
            .query_row(
                "SELECT coins FROM players WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(coins)
    }

    pub fn load(&self, key: &PlayerKey) -> Result<Option<PlayerRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, coins, last_source, created_at, updated_at
                 FROM players WHERE key = ?1",
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, coins, last_source, created_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(PlayerRecord {
            key: key.clone(),
            name,
            coins,
            party_scores: self.party_scores(key)?,
            last_source,
            created_at: from_millis(3, created_at)?,
            updated_at: from_millis(4, updated_at)?,
        }))
    }

    pub fn party_scores(&self, key: &PlayerKey) -> Result<BTreeMap<String, PartyScore>> {
        let mut stmt = self.conn.prepare(
            "SELECT game_id, last_score, best_score
             FROM party_scores WHERE player_key = ?1",
        )?;

        let score_iter = stmt.query_map(params![key.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                PartyScore {
                    last_score: row.get(1)?,
                    best_score: row.get(2)?,
                },
            ))
        })?;

        let mut scores = BTreeMap::new();
        for score in score_iter {
            let (game_id, score) = score?;
            scores.insert(game_id, score);
        }

        Ok(scores)
    }

    pub fn party_score(&self, key: &PlayerKey, game_id: &str) -> Result<Option<PartyScore>> {
        let score = self
            .conn
            .query_row(
                "SELECT last_score, best_score FROM party_scores
                 WHERE player_key = ?1 AND game_id = ?2",
                params![key.as_str(), game_id],
                |row| {
                    Ok(PartyScore {
                        last_score: row.get(0)?,
                        best_score: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(score)
    }

    /// Create or refresh the player's registration. Always overwrites the
    /// name; never touches coins or scores.
    pub fn upsert_registration(
        &self,
        key: &PlayerKey,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO players (key, name, coins, last_source, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?4)
             ON CONFLICT(key) DO UPDATE SET
                name = excluded.name,
                last_source = excluded.last_source,
                updated_at = excluded.updated_at",
            params![
                key.as_str(),
                name,
                EventSource::Registration.to_string(),
                to_millis(now),
            ],
        )?;

        Ok(())
    }

    /// Insert a default row for an unseen key. No-op for existing players.
    pub fn ensure(&self, key: &PlayerKey, now: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO players (key, name, coins, last_source, created_at, updated_at)
             VALUES (?1, '', 0, '', ?2, ?2)",
            params![key.as_str(), to_millis(now)],
        )?;

        Ok(())
    }

    /// In-place increment of the balance. Never a blind overwrite, so it
    /// composes with any other committed increment.
    pub fn add_coins(
        &self,
        key: &PlayerKey,
        delta: i64,
        source: &EventSource,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE players SET coins = coins + ?2, last_source = ?3, updated_at = ?4
             WHERE key = ?1",
            params![key.as_str(), delta, source.to_string(), to_millis(now)],
        )?;

        Ok(())
    }

    pub fn put_party_score(&self, key: &PlayerKey, game_id: &str, score: PartyScore) -> Result<()> {
        self.conn.execute(
            "INSERT INTO party_scores (player_key, game_id, last_score, best_score)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(player_key, game_id) DO UPDATE SET
                last_score = excluded.last_score,
                best_score = excluded.best_score",
            params![key.as_str(), game_id, score.last_score, score.best_score],
        )?;

        Ok(())
    }

    pub fn list_keys(&self) -> Result<Vec<PlayerKey>> {
        let mut stmt = self.conn.prepare("SELECT key FROM players ORDER BY key")?;
        let key_iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for key in key_iter {
            keys.push(PlayerKey::from_stored(key?));
        }

        Ok(keys)
    }
}
