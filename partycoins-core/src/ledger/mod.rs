pub mod audit;
pub mod config;

pub use audit::{AuditMismatch, AuditReport};
pub use config::{LedgerConfig, RetryPolicy};

use crate::error::{LedgerError, Result};
use crate::requests::{Award, Registration, Spend};
use crate::storage::{EventStore, NewEvent, PlayerStore, Storage};
use crate::types::{EventSource, LedgerEvent, PartyScore, PlayerKey, PlayerRecord, Receipt};
use chrono::Utc;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

/// Process-wide handle on the player ledger. Open once at startup, share
/// behind an `Arc`, and [`Ledger::close`] on shutdown.
///
/// Every balance change runs as one immediate transaction that updates the
/// player row and appends exactly one event, so the two commit together or
/// not at all.
pub struct Ledger {
    storage: Storage,
    config: LedgerConfig,
}

impl Ledger {
    pub async fn open(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let storage = Storage::new(&config).await?;

        tracing::info!("Opened ledger at {}", config.db_path.display());
        Ok(Self { storage, config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub async fn register(&self, cmd: &Registration) -> Result<()> {
        self.storage
            .transaction(|tx| {
                PlayerStore::new(tx).upsert_registration(&cmd.key, &cmd.name, Utc::now())
            })
            .await?;

        tracing::info!("Registered player {}", cmd.key);
        Ok(())
    }

    /// Credit a game result: record the score, keep the best score
    /// monotonic and add the coins.
    pub async fn award(&self, cmd: &Award) -> Result<Receipt> {
        let source = EventSource::Party(cmd.game_id.clone());

        let receipt = self
            .storage
            .transaction(|tx| {
                let now = Utc::now();
                let players = PlayerStore::new(tx);
                players.ensure(&cmd.key, now)?;

                let current = players.coins(&cmd.key)?.unwrap_or(0);
                let balance = current.checked_add(cmd.coins).ok_or_else(|| {
                    LedgerError::invalid_input(format!(
                        "award of {} coins overflows the balance of {}",
                        cmd.coins, cmd.key
                    ))
                })?;

                let best_score = match players.party_score(&cmd.key, &cmd.game_id)? {
                    Some(current) => current.best_score.max(cmd.score),
                    None => cmd.score,
                };
                players.put_party_score(
                    &cmd.key,
                    &cmd.game_id,
                    PartyScore {
                        last_score: cmd.score,
                        best_score,
                    },
                )?;
                players.add_coins(&cmd.key, cmd.coins, &source, now)?;

                let event = EventStore::new(tx).append(NewEvent {
                    player_key: &cmd.key,
                    source: source.clone(),
                    amount: cmd.coins,
                    score: Some(cmd.score),
                    created_at: now,
                })?;

                Ok(Receipt {
                    event_id: event.id,
                    balance,
                })
            })
            .await?;

        tracing::info!(
            "Awarded {} coins to {} from {} (score {})",
            cmd.coins,
            cmd.key,
            source,
            cmd.score
        );
        Ok(receipt)
    }

    /// Debit coins if, and only if, the balance read inside the same
    /// transaction covers the amount.
    pub async fn spend(&self, cmd: &Spend) -> Result<Receipt> {
        let source = EventSource::for_spend(cmd.reason.as_deref());

        let receipt = self
            .storage
            .transaction(|tx| {
                let now = Utc::now();
                let players = PlayerStore::new(tx);

                let available = players.coins(&cmd.key)?.unwrap_or(0);
                if available < cmd.amount {
                    return Err(LedgerError::InsufficientFunds {
                        need: cmd.amount,
                        available,
                    });
                }

                players.add_coins(&cmd.key, -cmd.amount, &source, now)?;
                let event = EventStore::new(tx).append(NewEvent {
                    player_key: &cmd.key,
                    source: source.clone(),
                    amount: -cmd.amount,
                    score: None,
                    created_at: now,
                })?;

                Ok(Receipt {
                    event_id: event.id,
                    balance: available - cmd.amount,
                })
            })
            .await?;

        tracing::info!("Spent {} coins of {} on {}", cmd.amount, cmd.key, source);
        Ok(receipt)
    }

    /// Latest committed balance, 0 for unknown players.
    pub async fn balance(&self, key: &PlayerKey) -> Result<i64> {
        let conn = self.storage.get_connection().await;
        let coins = PlayerStore::new(&conn).coins(key)?;
        Ok(coins.unwrap_or(0))
    }

    pub async fn player(&self, key: &PlayerKey) -> Result<Option<PlayerRecord>> {
        let conn = self.storage.get_connection().await;
        // one snapshot for the player row and its scores
        let snapshot = conn.unchecked_transaction()?;
        let record = PlayerStore::new(&snapshot).load(key)?;
        Ok(record)
    }

    /// The player's most recent events, oldest first.
    pub async fn history(&self, key: &PlayerKey, limit: Option<usize>) -> Result<Vec<LedgerEvent>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let conn = self.storage.get_connection().await;
        let events = EventStore::new(&conn).recent_for_player(key, limit)?;
        Ok(events)
    }

    /// Check that each player's balance equals the sum of their events.
    /// Audits every player when `key` is `None`.
    pub async fn audit(&self, key: Option<&PlayerKey>) -> Result<AuditReport> {
        let conn = self.storage.get_connection().await;
        let snapshot = conn.unchecked_transaction()?;
        let report = audit::run(&snapshot, key)?;

        if report.is_consistent() {
            tracing::info!("Audit passed for {} players", report.players_checked);
        } else {
            tracing::warn!(
                "Audit found {} mismatches across {} players",
                report.mismatches.len(),
                report.players_checked
            );
        }
        Ok(report)
    }

    pub fn close(self) -> Result<()> {
        self.storage.close()?;
        tracing::info!("Closed ledger at {}", self.config.db_path.display());
        Ok(())
    }
}
