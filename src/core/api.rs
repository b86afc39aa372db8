// src/core/api.rs

//! HTTP control surface: `/get`, `/set/:new/:meta`, `/notify/:val/:gen`, and
//! `/metrics`, all bound to `{bind_addr}:{api_port}`.
//!
//! Grounded on `original_source/main.go: launchHTTPAPI` for the endpoint
//! contract and on the teacher's `src/server/metrics_server.rs` for the
//! `axum::Router` + graceful-shutdown idiom this module reuses.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::core::counter::SharedCounter;
use crate::core::metrics::gather_metrics;

#[derive(Clone)]
pub struct ApiState {
    pub counter: Arc<SharedCounter>,
}

async fn get_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let snap = state.counter.get();
    snap.value.to_string()
}

async fn set_handler(
    State(state): State<ApiState>,
    Path((new_val, meta)): Path<(String, String)>,
) -> impl IntoResponse {
    match new_val.parse::<i64>() {
        Ok(v) => {
            state.counter.set(v, meta);
            (StatusCode::OK, v.to_string())
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

#[derive(Deserialize)]
struct NotifyQuery {
    notifier: Option<String>,
}

async fn notify_handler(
    State(state): State<ApiState>,
    Path((cur_val, cur_generation)): Path<(String, String)>,
    Query(query): Query<NotifyQuery>,
) -> impl IntoResponse {
    let val: i64 = match cur_val.parse() {
        Ok(v) => v,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()),
    };
    let generation: u64 = match cur_generation.parse() {
        Ok(g) => g,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()),
    };
    let notifier = query.notifier.unwrap_or_default();

    if state.counter.notify(val, generation, &notifier) {
        info!(new_value = val, generation, notifier, "new value notification");
        (StatusCode::OK, String::new())
    } else {
        (StatusCode::OK, String::new())
    }
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/get", get(get_handler))
        .route("/set/{new_val}/{meta}", get(set_handler))
        .route("/notify/{cur_val}/{cur_generation}", post(notify_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Binds and serves the control surface until `shutdown_rx` fires.
///
/// Bind failure is fatal: the caller logs the `std::io::Error` and exits
/// the process rather than running without a control surface.
pub async fn run(
    bind_addr: &str,
    api_port: &str,
    counter: Arc<SharedCounter>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr = format!("{bind_addr}:{api_port}");
    let app = router(ApiState { counter });

    info!(address = %addr, "started API");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("control surface shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_returns_ok_regardless_of_adoption() {
        let state = ApiState {
            counter: Arc::new(SharedCounter::new()),
        };
        let first = notify_handler(
            State(state.clone()),
            Path(("5".to_string(), "1".to_string())),
            Query(NotifyQuery {
                notifier: Some("n1".to_string()),
            }),
        )
        .await;
        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(state.counter.get().value, 5);

        // A stale notify still returns 200, it just doesn't mutate (§4.4).
        let stale = notify_handler(
            State(state.clone()),
            Path(("1".to_string(), "0".to_string())),
            Query(NotifyQuery {
                notifier: Some("n2".to_string()),
            }),
        )
        .await;
        assert_eq!(stale.0, StatusCode::OK);
        assert_eq!(state.counter.get().value, 5);
    }

    #[tokio::test]
    async fn set_rejects_non_integer_value() {
        let state = ApiState {
            counter: Arc::new(SharedCounter::new()),
        };
        let resp = set_handler(
            State(state),
            Path(("not-a-number".to_string(), "meta".to_string())),
        )
        .await;
        assert_eq!(resp.0, StatusCode::BAD_REQUEST);
    }
}
