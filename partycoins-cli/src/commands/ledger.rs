use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use partycoins_core::{Ledger, PlayerKey, Result};

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// List a player's most recent ledger events
    History {
        /// Phone number
        phone: String,
        /// Number of events to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Check every balance against the sum of its events
    Audit {
        /// Only audit this player
        phone: Option<String>,
    },
}

pub async fn handle_ledger_command(cmd: LedgerCommands, ledger: &Ledger) -> Result<()> {
    match cmd {
        LedgerCommands::History { phone, limit } => {
            let key = PlayerKey::parse(&phone)?;
            let events = ledger.history(&key, limit).await?;

            if events.is_empty() {
                println!("No events for {}", key);
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["#", "Time", "Source", "Amount", "Score"]);

            for event in &events {
                table.add_row(vec![
                    event.seq.to_string(),
                    event.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    event.source.clone(),
                    format!("{:+}", event.amount),
                    event.score.map(|s| s.to_string()).unwrap_or_default(),
                ]);
            }

            println!("Events for {}:", key);
            println!("{}", table);
        }

        LedgerCommands::Audit { phone } => {
            let key = phone.as_deref().map(PlayerKey::parse).transpose()?;
            let report = ledger.audit(key.as_ref()).await?;

            println!(
                "Checked {} players, {} events",
                report.players_checked, report.events_checked
            );

            if report.is_consistent() {
                println!("Ledger is consistent");
            } else {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Player", "Recorded", "From events"]);

                for mismatch in &report.mismatches {
                    table.add_row(vec![
                        mismatch.key.to_string(),
                        mismatch.recorded.to_string(),
                        mismatch.derived.to_string(),
                    ]);
                }

                println!("Found {} mismatches:", report.mismatches.len());
                println!("{}", table);
            }
        }
    }

    Ok(())
}
