//! In-process dashboard API used by tests

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};
use trafficscope_common::{Exchange, RawTimestamp, ResponseRecord};

/// Canned responses served by the fixture API
pub struct FixtureState {
    pub requests: String,
    pub stats: String,
    pub health: String,
    pub requests_status: StatusCode,
    pub stats_status: StatusCode,
    pub clear_status: StatusCode,
    pub clear_calls: usize,
}

pub type SharedFixture = Arc<Mutex<FixtureState>>;

impl FixtureState {
    pub fn shared() -> SharedFixture {
        Arc::new(Mutex::new(Self {
            requests: "[]".to_string(),
            stats: r#"{"total_requests":2,"open_connections":2,"avg_response_time_1m":12.5,"avg_response_time_5m":10.0,"p50_response_time":8.0,"p90_response_time":40.0}"#.to_string(),
            health: r#"{"status":"ok","log_provider":true}"#.to_string(),
            requests_status: StatusCode::OK,
            stats_status: StatusCode::OK,
            clear_status: StatusCode::NO_CONTENT,
            clear_calls: 0,
        }))
    }
}

/// Serve the fixture API under `mount` (e.g. `/api/`) and return the server root URL
pub async fn spawn_api(mount: &str, state: SharedFixture) -> String {
    let app = Router::new()
        .route(
            &format!("{}requests", mount),
            get(get_requests).delete(delete_requests),
        )
        .route(&format!("{}stats", mount), get(get_stats))
        .route(&format!("{}health", mount), get(get_health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}/", addr)
}

async fn get_requests(State(state): State<SharedFixture>) -> Response {
    let state = state.lock().unwrap();
    (state.requests_status, state.requests.clone()).into_response()
}

async fn get_stats(State(state): State<SharedFixture>) -> Response {
    let state = state.lock().unwrap();
    (state.stats_status, state.stats.clone()).into_response()
}

async fn get_health(State(state): State<SharedFixture>) -> Response {
    let state = state.lock().unwrap();
    (StatusCode::OK, state.health.clone()).into_response()
}

async fn delete_requests(State(state): State<SharedFixture>) -> StatusCode {
    let mut state = state.lock().unwrap();
    state.clear_calls += 1;
    if state.clear_status.is_success() {
        state.requests = "[]".to_string();
    }
    state.clear_status
}

/// A completed GET exchange captured a few seconds ago
pub fn sample_exchange(id: &str) -> Exchange {
    Exchange {
        id: id.to_string(),
        method: "GET".to_string(),
        url: format!("/items/{}", id),
        remote_address: "10.0.0.1:40000".to_string(),
        status_code: 200,
        duration: 1_500_000,
        timestamp: Some(RawTimestamp::from(Utc::now() - Duration::seconds(5))),
        response: ResponseRecord {
            status_code: 200,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// JSON body for `GET requests` containing the given ids, oldest-first
pub fn exchange_json(ids: &[&str]) -> String {
    let exchanges: Vec<Exchange> = ids.iter().map(|id| sample_exchange(id)).collect();
    serde_json::to_string(&exchanges).unwrap()
}
