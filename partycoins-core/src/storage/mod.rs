pub mod event_store;
pub mod player_store;

pub use event_store::{EventStore, NewEvent};
pub use player_store::PlayerStore;

use crate::error::{LedgerError, Result};
use crate::ledger::config::{LedgerConfig, RetryPolicy};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

pub struct Storage {
    conn: Mutex<Connection>,
    retry: RetryPolicy,
}

impl Storage {
    pub async fn new(config: &LedgerConfig) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&config.db_path)?;
        conn.busy_timeout(config.busy_timeout)?;
        // WAL keeps balance reads from waiting on an open write transaction
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

        let storage = Self {
            conn: Mutex::new(conn),
            retry: config.retry,
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS players (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                coins INTEGER NOT NULL DEFAULT 0,
                last_source TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS party_scores (
                player_key TEXT NOT NULL,
                game_id TEXT NOT NULL,
                last_score INTEGER NOT NULL,
                best_score INTEGER NOT NULL,
                FOREIGN KEY (player_key) REFERENCES players(key),
                PRIMARY KEY (player_key, game_id)
            );

            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                player_key TEXT NOT NULL,
                source TEXT NOT NULL,
                amount INTEGER NOT NULL,
                score INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (player_key) REFERENCES players(key)
            );

            CREATE INDEX IF NOT EXISTS idx_events_player ON events (player_key, seq);",
        )?;

        Ok(())
    }

    /// Direct access for reads. Mutations go through [`Storage::transaction`].
    pub async fn get_connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Run `op` inside an immediate (write-locking) transaction and commit.
    ///
    /// Any error from `op` rolls the transaction back. When the database is
    /// locked by another connection the whole read-modify-write is replayed
    /// from scratch, so `op` must derive everything it writes from what it
    /// reads through the transaction.
    pub async fn transaction<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().await;
        let mut attempt = 1;

        loop {
            match run_immediate(&mut conn, &mut op) {
                Err(err) if err.is_conflict() => {
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!("Transaction still conflicting after {} attempts", attempt);
                        return Err(LedgerError::TransactionConflict { attempts: attempt });
                    }
                    attempt += 1;
                    tracing::debug!("Transaction conflict ({}), retry attempt {}", err, attempt);
                    tokio::time::sleep(self.retry.delay_before(attempt)).await;
                }
                outcome => return outcome,
            }
        }
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, err)| LedgerError::from(err))
    }
}

fn run_immediate<T, F>(conn: &mut Connection, op: &mut F) -> Result<T>
where
    F: FnMut(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Decode a stored millisecond timestamp read from column `idx`.
pub(crate) fn from_millis(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("timestamp {} out of range", ms).into(),
        )
    })
}
