use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use partycoins_core::{Ledger, LedgerConfig};
use partycoins_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app(api_key: Option<&str>) -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ledger = Ledger::open(LedgerConfig::new(dir.path()))
        .await
        .expect("open ledger");
    let app = router(AppState::new(Arc::new(ledger), api_key.map(str::to_string)));
    (dir, app)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn party_scenario_over_http() {
    let (_dir, app) = test_app(None).await;

    let (status, body) = send(
        &app,
        post("/register", json!({"phone": "555-0100", "name": "Ann"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, body) = send(&app, get("/coins?phone=555-0100")).await;
    assert_eq!(body, json!({"coins": 0}));

    let (status, body) = send(
        &app,
        post(
            "/partyResult",
            json!({"phone": "5550100", "gameId": "run", "score": 10, "coins": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "coins": 5}));

    send(
        &app,
        post(
            "/partyResult",
            json!({"phone": "5550100", "gameId": "run", "score": 3, "coins": 2}),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/player?phone=5550100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ann");
    assert_eq!(body["coins"], 7);
    assert_eq!(body["partyScores"]["run"], json!({"lastScore": 3, "bestScore": 10}));

    let (status, body) = send(&app, post("/spend", json!({"phone": "5550100", "amount": 7}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "coins": 0}));

    let (status, body) = send(&app, post("/spend", json!({"phone": "5550100", "amount": 1}))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, json!({"error": "insufficient coins"}));

    let (_, body) = send(&app, get("/coins?phone=5550100")).await;
    assert_eq!(body, json!({"coins": 0}));

    let (_, body) = send(&app, get("/events?phone=5550100")).await;
    let amounts: Vec<i64> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["amount"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, vec![5, 2, -7]);
    assert_eq!(body["events"][0]["source"], "party:run");
}

#[tokio::test]
async fn invalid_input_is_bad_request() {
    let (_dir, app) = test_app(None).await;

    let (status, body) = send(&app, post("/register", json!({"name": "Ann"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "phone is required"}));

    let (status, _) = send(&app, post("/partyResult", json!({"phone": "5550100"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post("/spend", json!({"phone": "5550100", "amount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/coins")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/spend")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_player_is_not_found() {
    let (_dir, app) = test_app(None).await;

    let (status, body) = send(&app, get("/player?phone=5550999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "player 5550999 not found"}));

    // balance of an unknown player is simply zero
    let (status, body) = send(&app, get("/coins?phone=5550999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"coins": 0}));
}

#[tokio::test]
async fn gate_requires_shared_secret() {
    let (_dir, app) = test_app(Some("s3cret")).await;

    let (status, body) = send(&app, get("/coins?phone=5550100")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "unauthorized"}));

    let wrong = Request::builder()
        .uri("/coins?phone=5550100")
        .header("x-api-key", "guess")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let with_header = Request::builder()
        .uri("/coins?phone=5550100")
        .header("x-api-key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, with_header).await.0, StatusCode::OK);

    let (status, _) = send(&app, get("/coins?phone=5550100&key=s3cret")).await;
    assert_eq!(status, StatusCode::OK);

    // nothing was written by the rejected mutation
    let (status, _) = send(&app, post("/partyResult", json!({"phone": "5550100", "gameId": "run", "coins": 3}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, body) = send(&app, get("/coins?phone=5550100&key=s3cret")).await;
    assert_eq!(body, json!({"coins": 0}));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}
