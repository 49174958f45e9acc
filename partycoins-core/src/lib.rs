//! partycoins - coin ledger for party game players
//!
//! Players are keyed by normalized phone number. Awards from game results
//! credit coins and track per-game scores, spends debit coins after a
//! sufficiency check, and every balance change appends one immutable event
//! in the same SQLite transaction as the balance update.

pub mod error;
pub mod ledger;
pub mod phone;
pub mod requests;
pub mod storage;
pub mod types;

pub use error::{LedgerError, Result};
pub use ledger::{AuditMismatch, AuditReport, Ledger, LedgerConfig, RetryPolicy};
pub use phone::normalize_phone;
pub use requests::{Award, AwardRequest, RegisterRequest, Registration, Spend, SpendRequest};
pub use types::{EventSource, LedgerEvent, PartyScore, PlayerKey, PlayerRecord, Receipt};
