use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use partycoins_core::{Ledger, PlayerKey, RegisterRequest, Result};

#[derive(Subcommand)]
pub enum PlayerCommands {
    /// Register a player, or update the name of an existing one
    Register {
        /// Phone number (any formatting)
        phone: String,
        /// Display name; omitting it clears the stored name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show a player's record and party scores
    Show {
        /// Phone number
        phone: String,
    },
}

pub async fn handle_player_command(cmd: PlayerCommands, ledger: &Ledger) -> Result<()> {
    match cmd {
        PlayerCommands::Register { phone, name } => {
            let registration = RegisterRequest {
                phone: Some(phone),
                name,
            }
            .validate()?;
            ledger.register(&registration).await?;

            println!("Registered player {}", registration.key);
        }

        PlayerCommands::Show { phone } => {
            let key = PlayerKey::parse(&phone)?;

            let Some(record) = ledger.player(&key).await? else {
                println!("No player with phone {}", key);
                return Ok(());
            };

            println!("Player {}:", record.key);
            if !record.name.is_empty() {
                println!("  Name: {}", record.name);
            }
            println!("  Coins: {}", record.coins);
            println!("  Last source: {}", record.last_source);
            println!(
                "  Updated: {}",
                record.updated_at.format("%Y-%m-%d %H:%M:%S")
            );

            if !record.party_scores.is_empty() {
                println!();
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Game", "Last score", "Best score"]);

                for (game_id, score) in &record.party_scores {
                    table.add_row(vec![
                        game_id.clone(),
                        score.last_score.to_string(),
                        score.best_score.to_string(),
                    ]);
                }

                println!("{}", table);
            }
        }
    }

    Ok(())
}
