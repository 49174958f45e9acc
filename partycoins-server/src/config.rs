use partycoins_core::{LedgerConfig, LedgerError, Result, RetryPolicy};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    /// Shared secret for the gate. `None` lets every request through.
    pub api_key: Option<String>,
    pub ledger: LedgerConfig,
}

impl ServerConfig {
    /// Load from the process environment, after `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("PARTYCOINS_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind: SocketAddr = bind
            .parse()
            .map_err(|e| LedgerError::config(format!("Invalid PARTYCOINS_BIND '{}': {}", bind, e)))?;

        let data_dir = lookup("PARTYCOINS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let api_key = lookup("PARTYCOINS_API_KEY").filter(|key| !key.trim().is_empty());

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = lookup("PARTYCOINS_MAX_ATTEMPTS") {
            retry.max_attempts = attempts.parse().map_err(|_| {
                LedgerError::config(format!("Invalid PARTYCOINS_MAX_ATTEMPTS '{}'", attempts))
            })?;
        }

        let mut ledger = LedgerConfig::new(&data_dir).with_retry(retry);
        if let Some(ms) = lookup("PARTYCOINS_BUSY_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                LedgerError::config(format!("Invalid PARTYCOINS_BUSY_TIMEOUT_MS '{}'", ms))
            })?;
            ledger = ledger.with_busy_timeout(Duration::from_millis(ms));
        }
        ledger.validate()?;

        Ok(Self {
            bind,
            data_dir,
            api_key,
            ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.api_key.is_none());
        assert_eq!(config.ledger.retry.max_attempts, 5);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PARTYCOINS_BIND", "127.0.0.1:9000"),
            ("PARTYCOINS_DATA_DIR", "/var/lib/partycoins"),
            ("PARTYCOINS_API_KEY", "s3cret"),
            ("PARTYCOINS_MAX_ATTEMPTS", "9"),
            ("PARTYCOINS_BUSY_TIMEOUT_MS", "40"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
        assert!(config.ledger.db_path.starts_with("/var/lib/partycoins"));
        assert_eq!(config.ledger.retry.max_attempts, 9);
        assert_eq!(config.ledger.busy_timeout, Duration::from_millis(40));
    }

    #[test]
    fn test_blank_key_disables_gate() {
        let config = load(&[("PARTYCOINS_API_KEY", "  ")]).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("PARTYCOINS_BIND", "nowhere")]).is_err());
        assert!(load(&[("PARTYCOINS_MAX_ATTEMPTS", "0")]).is_err());
        assert!(load(&[("PARTYCOINS_BUSY_TIMEOUT_MS", "soon")]).is_err());
    }
}
