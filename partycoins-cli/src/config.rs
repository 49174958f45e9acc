use partycoins_core::LedgerConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("partycoins"),
            verbose: false,
        }
    }
}

impl CliConfig {
    /// `--data-dir`, then `PARTYCOINS_DATA_DIR` (shared with the server),
    /// then the platform data directory.
    pub fn resolve(data_dir: Option<PathBuf>, verbose: bool) -> Self {
        let data_dir = data_dir
            .or_else(|| std::env::var_os("PARTYCOINS_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(|| Self::default().data_dir);

        Self { data_dir, verbose }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(&self.data_dir)
    }
}
