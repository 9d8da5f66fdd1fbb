//! Read-only status API: `/healthz`, `/status`, `/events`.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::daemon::PhaseCell;
use crate::history::EventHistory;
use crate::metrics::Metrics;
use crate::types::Event;

const DEFAULT_EVENT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub history: Arc<EventHistory>,
    pub phase: Arc<PhaseCell>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: &'static str,
    phase: &'static str,
    uptime_s: u64,
    cycles_run: u64,
    events_emitted: u64,
    detector_errors: u64,
    alerts_sent: u64,
    alerts_failed: u64,
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .route("/events", get(events))
        .with_state(state)
}

/// Bind the listen socket. Kept separate from [`serve`] so a bad address
/// fails startup instead of a background task.
pub async fn bind(addr: &str) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind status API to {addr}"))
}

/// Serve until the process exits.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("[server] status API listening on {addr}");
    }
    axum::serve(listener, router(state))
        .await
        .context("status API server failed")
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let summary = state.metrics.snapshot();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        phase: state.phase.get().as_str(),
        uptime_s: summary.uptime_s,
        cycles_run: summary.cycles_run,
        events_emitted: summary.events_emitted,
        detector_errors: summary.detector_errors,
        alerts_sent: summary.alerts_sent,
        alerts_failed: summary.alerts_failed,
    })
}

async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Json(state.history.recent(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Tier};
    use std::collections::BTreeMap;

    fn test_state() -> AppState {
        AppState {
            metrics: Arc::new(Metrics::new()),
            history: Arc::new(EventHistory::new(10, None)),
            phase: Arc::new(PhaseCell::default()),
        }
    }

    #[tokio::test]
    async fn status_reports_counters_and_phase() {
        let state = test_state();
        state.metrics.inc_cycles();
        state.phase.set(crate::daemon::Phase::Sleeping);

        let Json(resp) = status(State(state)).await;
        assert_eq!(resp.cycles_run, 1);
        assert_eq!(resp.phase, "sleeping");
        assert_eq!(resp.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn events_respects_limit() {
        let state = test_state();
        for n in 0..5 {
            state.history.append(Event {
                timestamp: 1756400000 + n,
                category: Category::Drift,
                tier: Tier::Elevated,
                intensity: 0.5,
                pattern: format!("p{n}"),
                detail_metrics: BTreeMap::new(),
                message: "m".to_string(),
                recommended_action: "a".to_string(),
            });
        }

        let Json(events) = events(
            State(state),
            Query(EventsQuery { limit: Some(2) }),
        )
        .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pattern, "p4");
    }
}
