//! Ledger behaviour under contention.
//!
//! Two `Ledger` handles on the same database file stand in for two
//! processes (server and CLI): each has its own SQLite connection, so they
//! really do race for the write lock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use partycoins_core::{
    Award, Ledger, LedgerConfig, LedgerError, PlayerKey, RetryPolicy, Spend,
};
use rusqlite::Connection;

fn patient_config(dir: &Path) -> LedgerConfig {
    LedgerConfig::new(dir)
        .with_busy_timeout(Duration::from_secs(2))
        .with_retry(RetryPolicy {
            max_attempts: 20,
            backoff: Duration::from_millis(5),
        })
}

async fn open_pair(dir: &Path) -> (Arc<Ledger>, Arc<Ledger>) {
    let a = Ledger::open(patient_config(dir)).await.expect("open first ledger");
    let b = Ledger::open(patient_config(dir)).await.expect("open second ledger");
    (Arc::new(a), Arc::new(b))
}

fn key(phone: &str) -> PlayerKey {
    PlayerKey::parse(phone).unwrap()
}

fn award(phone: &str, game_id: &str, score: i64, coins: i64) -> Award {
    Award {
        key: key(phone),
        game_id: game_id.to_string(),
        score,
        coins,
    }
}

fn spend(phone: &str, amount: i64) -> Spend {
    Spend {
        key: key(phone),
        amount,
        reason: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_awards_lose_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = open_pair(dir.path()).await;

    let mut handles = Vec::new();
    let mut expected = 0;
    for i in 0..40i64 {
        let ledger = if i % 2 == 0 { a.clone() } else { b.clone() };
        expected += i + 1;
        handles.push(tokio::spawn(async move {
            ledger.award(&award("5550100", "run", i, i + 1)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("award committed");
    }

    let player = key("5550100");
    assert_eq!(a.balance(&player).await.unwrap(), expected);
    assert_eq!(b.balance(&player).await.unwrap(), expected);

    let events = a.history(&player, Some(100)).await.unwrap();
    assert_eq!(events.len(), 40);
    assert_eq!(events.iter().map(|e| e.amount).sum::<i64>(), expected);

    let record = a.player(&player).await.unwrap().unwrap();
    assert_eq!(record.party_scores["run"].best_score, 39);
    assert!(a.audit(None).await.unwrap().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spends_never_overdraw() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = open_pair(dir.path()).await;
    a.award(&award("5550100", "run", 1, 10)).await.unwrap();

    let first = {
        let a = a.clone();
        tokio::spawn(async move { a.spend(&spend("5550100", 7)).await })
    };
    let second = {
        let b = b.clone();
        tokio::spawn(async move { b.spend(&spend("5550100", 7)).await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(LedgerError::InsufficientFunds {
            need: 7,
            available: 3
        })
    )));
    assert_eq!(a.balance(&key("5550100")).await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_small_spends_stop_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = open_pair(dir.path()).await;
    a.award(&award("5550100", "run", 1, 10)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..25 {
        let ledger = if i % 2 == 0 { a.clone() } else { b.clone() };
        handles.push(tokio::spawn(async move {
            ledger.spend(&spend("5550100", 1)).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    let player = key("5550100");
    assert_eq!(b.balance(&player).await.unwrap(), 0);
    // one credit plus exactly one debit per successful spend
    assert_eq!(b.history(&player, None).await.unwrap().len(), 11);
    assert!(b.audit(Some(&player)).await.unwrap().is_consistent());
}

#[tokio::test]
async fn best_score_tracks_maximum() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(LedgerConfig::new(dir.path())).await.unwrap();

    for score in [3, 9, 2, 9, 5] {
        ledger.award(&award("5550100", "quiz", score, 0)).await.unwrap();
    }
    ledger.award(&award("5550100", "run", -4, 1)).await.unwrap();

    let record = ledger.player(&key("5550100")).await.unwrap().unwrap();
    assert_eq!(record.party_scores["quiz"].best_score, 9);
    assert_eq!(record.party_scores["quiz"].last_score, 5);
    assert_eq!(record.party_scores["run"].best_score, -4);
    // zero-coin awards still leave an event each
    assert_eq!(ledger.history(&record.key, None).await.unwrap().len(), 6);
}

#[tokio::test]
async fn equivalent_phones_share_a_record() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(LedgerConfig::new(dir.path())).await.unwrap();

    ledger
        .award(&award("+1 (555) 123-4567", "run", 1, 4))
        .await
        .unwrap();
    ledger.spend(&spend("+15551234567", 4)).await.unwrap();

    assert_eq!(ledger.balance(&key("+1-555-123-4567")).await.unwrap(), 0);
    assert_eq!(ledger.history(&key("+15551234567"), None).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exhausted_retries_surface_as_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::new(dir.path())
        .with_busy_timeout(Duration::from_millis(10))
        .with_retry(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        });
    let ledger = Ledger::open(config.clone()).await.unwrap();
    ledger.award(&award("5550100", "run", 1, 5)).await.unwrap();

    // another writer grabs the lock and sits on it
    let blocker = Connection::open(&config.db_path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

    let err = ledger.spend(&spend("5550100", 2)).await.unwrap_err();
    assert!(matches!(err, LedgerError::TransactionConflict { attempts: 3 }));
    assert!(!err.is_client_error());

    // reads are not blocked by the writer
    assert_eq!(ledger.balance(&key("5550100")).await.unwrap(), 5);

    blocker.execute_batch("ROLLBACK").unwrap();
    let receipt = ledger.spend(&spend("5550100", 2)).await.unwrap();
    assert_eq!(receipt.balance, 3);
    assert_eq!(ledger.history(&key("5550100"), None).await.unwrap().len(), 2);
}
