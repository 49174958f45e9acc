use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "partycoins.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub db_path: PathBuf,
    /// How long SQLite itself waits on a locked database before reporting
    /// a conflict.
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
}

/// Bound on transparent retries of conflicting transactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n` is `backoff * (n - 1)`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data").join(DB_FILE_NAME),
            busy_timeout: Duration::from_millis(250),
            retry: RetryPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Config for the database file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(LedgerError::config("Database path cannot be empty"));
        }

        if self.retry.max_attempts == 0 {
            return Err(LedgerError::config(
                "Retry max_attempts must be greater than 0",
            ));
        }

        Ok(())
    }
}
