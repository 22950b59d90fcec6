//! Poll-and-reconcile plumbing
//!
//! Each sync tick fetches `requests`, `stats` and `health` concurrently in a
//! spawned task and reports the joint result back to the UI task, which owns
//! the session state and applies it. Ticks are numbered so a slow tick that
//! settles after a newer one can be recognised and dropped.

use crate::api::{ApiClient, ApiError};
use crate::tui::TuiEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trafficscope_common::{Exchange, HealthSnapshot, StatsSnapshot};

/// Everything a successful tick fetched
#[derive(Debug, Clone)]
pub struct SyncPayload {
    /// Exchanges in the order the service sent them (oldest-first)
    pub requests: Vec<Exchange>,
    pub stats: StatsSnapshot,
    pub health: HealthSnapshot,
}

/// Results reported back to the UI task
#[derive(Debug)]
pub enum SyncEvent {
    /// A sync tick settled
    TickCompleted {
        tick: u64,
        outcome: Result<SyncPayload, ApiError>,
    },
    /// A clear action settled
    ClearCompleted(Result<(), ApiError>),
}

/// Monotonic tick numbering, starting at 1
#[derive(Debug, Default)]
pub struct TickSequence {
    last: u64,
}

impl TickSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_tick(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Fetch all three resources concurrently; fails as soon as any one fails
pub async fn fetch_all(client: &ApiClient) -> Result<SyncPayload, ApiError> {
    let (requests, stats, health) = tokio::try_join!(
        client.fetch_requests(),
        client.fetch_stats(),
        client.fetch_health()
    )?;

    Ok(SyncPayload {
        requests,
        stats,
        health,
    })
}

/// Run one sync tick in the background
pub fn spawn_tick(client: ApiClient, tick: u64, tx: mpsc::Sender<TuiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = fetch_all(&client).await;
        if let Err(ref e) = outcome {
            tracing::debug!("Sync tick {} failed: {}", tick, e);
        }
        // Receiver is gone only when the UI is shutting down
        let _ = tx
            .send(TuiEvent::Sync(SyncEvent::TickCompleted { tick, outcome }))
            .await;
    })
}

/// Run the clear action in the background
pub fn spawn_clear(client: ApiClient, tx: mpsc::Sender<TuiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.clear_requests().await;
        let _ = tx
            .send(TuiEvent::Sync(SyncEvent::ClearCompleted(result)))
            .await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{exchange_json, spawn_api, FixtureState};
    use axum::http::StatusCode;
    use std::time::Duration;

    #[test]
    fn test_tick_sequence_is_monotonic() {
        let mut ticks = TickSequence::new();
        assert_eq!(ticks.next_tick(), 1);
        assert_eq!(ticks.next_tick(), 2);
        assert_eq!(ticks.next_tick(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_success() {
        let fixture = FixtureState::shared();
        fixture.lock().unwrap().requests = exchange_json(&["a", "b", "c"]);
        let base = spawn_api("/api/", fixture).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let payload = fetch_all(&client).await.unwrap();
        assert_eq!(payload.requests.len(), 3);
        assert_eq!(payload.requests[0].id, "a");
        assert_eq!(payload.stats.open_connections, 2);
        assert_eq!(payload.health.status, "ok");
    }

    #[tokio::test]
    async fn test_fetch_all_fails_when_any_fetch_fails() {
        let fixture = FixtureState::shared();
        fixture.lock().unwrap().requests = exchange_json(&["a"]);
        fixture.lock().unwrap().stats_status = StatusCode::BAD_GATEWAY;
        let base = spawn_api("/api/", fixture.clone()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        assert!(fetch_all(&client).await.is_err());

        fixture.lock().unwrap().stats_status = StatusCode::OK;
        fixture.lock().unwrap().requests = "{not json".to_string();
        assert!(matches!(
            fetch_all(&client).await,
            Err(ApiError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_spawned_tick_reports_back() {
        let fixture = FixtureState::shared();
        fixture.lock().unwrap().requests = exchange_json(&["a"]);
        let base = spawn_api("/api/", fixture).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        spawn_tick(client.clone(), 7, tx.clone()).await.unwrap();
        spawn_clear(client, tx).await.unwrap();

        match rx.recv().await {
            Some(TuiEvent::Sync(SyncEvent::TickCompleted { tick, outcome })) => {
                assert_eq!(tick, 7);
                assert_eq!(outcome.unwrap().requests.len(), 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await {
            Some(TuiEvent::Sync(SyncEvent::ClearCompleted(result))) => assert!(result.is_ok()),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
