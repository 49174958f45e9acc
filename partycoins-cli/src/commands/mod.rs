pub mod coins;
pub mod ledger;
pub mod player;

pub use coins::{handle_coins_command, CoinsCommands};
pub use ledger::{handle_ledger_command, LedgerCommands};
pub use player::{handle_player_command, PlayerCommands};
