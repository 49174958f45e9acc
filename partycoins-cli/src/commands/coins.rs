use clap::Subcommand;
use partycoins_core::{AwardRequest, Ledger, PlayerKey, Result, SpendRequest};

#[derive(Subcommand)]
pub enum CoinsCommands {
    /// Record a game result and credit coins
    Award {
        /// Phone number
        phone: String,
        /// Game identifier
        game_id: String,
        /// Score reached in the game
        #[arg(short, long, allow_negative_numbers = true)]
        score: Option<i64>,
        /// Coins to credit
        #[arg(short, long)]
        coins: Option<i64>,
    },
    /// Spend coins if the balance covers it
    Spend {
        /// Phone number
        phone: String,
        /// Coins to debit
        amount: i64,
        /// What the coins were spent on
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Show a player's coin balance
    Balance {
        /// Phone number
        phone: String,
    },
}

pub async fn handle_coins_command(cmd: CoinsCommands, ledger: &Ledger) -> Result<()> {
    match cmd {
        CoinsCommands::Award {
            phone,
            game_id,
            score,
            coins,
        } => {
            let award = AwardRequest {
                phone: Some(phone),
                game_id: Some(game_id),
                score,
                coins,
            }
            .validate()?;
            let receipt = ledger.award(&award).await?;

            println!(
                "Awarded {} coins to {} for {} (score {})",
                award.coins, award.key, award.game_id, award.score
            );
            println!("  Balance: {}", receipt.balance);
            println!("  Event: {}", receipt.event_id);
        }

        CoinsCommands::Spend {
            phone,
            amount,
            reason,
        } => {
            let spend = SpendRequest {
                phone: Some(phone),
                amount: Some(amount),
                reason,
            }
            .validate()?;
            let receipt = ledger.spend(&spend).await?;

            println!("Spent {} coins of {}", spend.amount, spend.key);
            println!("  Balance: {}", receipt.balance);
            println!("  Event: {}", receipt.event_id);
        }

        CoinsCommands::Balance { phone } => {
            let key = PlayerKey::parse(&phone)?;
            let coins = ledger.balance(&key).await?;
            println!("Balance for {}: {} coins", key, coins);
        }
    }

    Ok(())
}
