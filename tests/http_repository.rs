//! HTTP Repository Contract
//!
//! Runs the REST client against an in-process axum server that records every
//! request it receives.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_test::{assert_err, assert_ok};

use healflow::console::{ActionKind, HealConsole};
use healflow::repository::{HttpSignalRepository, SignalAction, SignalRepository};
use healflow::signal::{SignalId, SignalStatus, Vote};
use healflow::{DispatchError, RepositoryError, SyncConfig};

#[derive(Clone, Default)]
struct Backend {
    signals: Arc<Mutex<Value>>,
    posts: Arc<Mutex<Vec<(String, String, Option<Value>)>>>,
    fail_list: Arc<Mutex<bool>>,
}

async fn list(State(backend): State<Backend>) -> Result<Json<Value>, StatusCode> {
    if *backend.fail_list.lock().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(backend.signals.lock().await.clone()))
}

async fn act(
    State(backend): State<Backend>,
    Path((id, action)): Path<(String, String)>,
    body: Bytes,
) -> StatusCode {
    let body = serde_json::from_slice::<Value>(&body).ok();
    backend.posts.lock().await.push((id.clone(), action.clone(), body));

    let mut signals = backend.signals.lock().await;
    let Some(signal) = signals
        .as_array_mut()
        .and_then(|all| all.iter_mut().find(|s| s["id"].to_string().trim_matches('"') == id))
    else {
        return StatusCode::NOT_FOUND;
    };

    let status = signal["status"].as_str().map(str::to_owned);
    match (status.as_deref(), action.as_str()) {
        (Some("pending"), "heal") => {
            signal["status"] = json!("awaiting_approval");
            signal["diagnosis"] = json!({
                "root_cause": "gateway pool exhausted",
                "steps": [{"phase": "observe", "detail": "504 burst"}],
                "memory_informed": true
            });
            StatusCode::OK
        }
        (Some("awaiting_approval"), "accept") => {
            signal["status"] = json!("healed");
            StatusCode::OK
        }
        _ => StatusCode::CONFLICT,
    }
}

async fn serve(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/signals", get(list))
        .route("/api/signals/{id}/{action}", post(act))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend(signals: Value) -> Backend {
    Backend {
        signals: Arc::new(Mutex::new(signals)),
        ..Backend::default()
    }
}

fn seeded() -> Value {
    json!([
        {
            "id": 1,
            "merchant": "MUMBAI_PAY",
            "description": "GATEWAY_TIMEOUT_504",
            "status": "pending",
            "frequency": 88
        },
        {
            "id": 2,
            "merchant": "STEALTH_SAAS",
            "description": "AUTH_TOKEN_EXPIRED",
            "status": "quarantined",
            "frequency": 14
        }
    ])
}

fn repository(base_url: &str) -> HttpSignalRepository {
    HttpSignalRepository::new(&SyncConfig::default().with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_list_decodes_signals() {
    let base = serve(backend(seeded())).await;
    let signals = assert_ok!(repository(&base).list().await);

    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].id, SignalId::from("1"));
    assert_eq!(signals[0].status, SignalStatus::Pending);
    assert_eq!(signals[1].status, SignalStatus::Unknown("quarantined".into()));
}

#[tokio::test]
async fn test_mutations_hit_action_endpoints() {
    let backend = backend(seeded());
    let base = serve(backend.clone()).await;
    let repo = repository(&base);

    assert_ok!(repo.mutate(&"1".into(), SignalAction::Heal).await);
    let err = assert_err!(repo.mutate(&"1".into(), SignalAction::Feedback(Vote::Positive)).await);
    assert!(matches!(err, RepositoryError::Status { status: 409, .. }));

    let posts = backend.posts.lock().await.clone();
    assert_eq!(posts[0], ("1".to_string(), "heal".to_string(), None));
    assert_eq!(
        posts[1],
        ("1".to_string(), "feedback".to_string(), Some(json!({"vote": "positive"})))
    );
}

#[tokio::test]
async fn test_non_success_list_is_status_error() {
    let backend = backend(seeded());
    *backend.fail_list.lock().await = true;
    let base = serve(backend).await;

    let err = assert_err!(repository(&base).list().await);
    assert!(matches!(err, RepositoryError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_unreachable_repository_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = assert_err!(repository(&format!("http://{addr}")).list().await);
    assert!(matches!(err, RepositoryError::Transport(_)));
}

#[tokio::test]
async fn test_console_over_http() {
    let backend = backend(seeded());
    let base = serve(backend.clone()).await;
    let config = SyncConfig::default().with_base_url(base.as_str());
    let console = HealConsole::new(Arc::new(repository(&base)), &config);

    console.refresh().await.unwrap();
    assert_eq!(console.view().enabled_actions, BTreeSet::from([ActionKind::Heal]));

    console.dispatch_selected(SignalAction::Heal).await.unwrap();
    let view = console.view();
    assert_eq!(view.status_label, "AWAITING_APPROVAL");
    assert!(view.diagnosis_text.unwrap().contains("[informed by remediation memory]"));

    // The unknown-status signal renders but offers nothing.
    console.select("2");
    let view = console.view();
    assert_eq!(view.status_label, "UNKNOWN(quarantined)");
    assert!(view.enabled_actions.is_empty());

    // A rejected mutation still reconverges and reports the failure.
    let err = assert_err!(console.dispatch(SignalAction::Accept, &"2".into()).await);
    assert!(matches!(err, DispatchError::Mutation { action: "accept", .. }));
    assert!(!console.store().is_in_flight(&"2".into()));

    *backend.fail_list.lock().await = true;
    assert!(console.refresh().await.is_err());
    assert!(console.health().is_degraded());
    assert_eq!(console.snapshot().len(), 2);
}
