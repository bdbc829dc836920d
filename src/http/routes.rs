//! API route handlers
//!
//! - `GET /state/:domain` — conditional read (`ETag` / `If-None-Match`)
//! - `PUT /state/:domain` — commit a mutation, then invalidate + notify
//! - `GET /events` — push-channel admission (SSE), 503 at capacity
//! - `GET /stats` — hub/cache/version observability

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::Stream;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::hub::{push_channel, HubError, HubStats, NotificationHub, PushReceiver};
use crate::sync::{DomainRead, SyncContext};
use crate::version::render_token;

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    domain: String,
    version: u64,
}

#[derive(Debug, Serialize)]
struct CacheStatsResponse {
    valid_count: usize,
    expired_count: usize,
    total_count: usize,
    keys: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    hub: HubStats,
    cache: CacheStatsResponse,
    versions: std::collections::BTreeMap<String, u64>,
    flushes: u64,
}

/// Build the API router.
pub fn api_routes(ctx: Arc<SyncContext>) -> Router {
    Router::new()
        .route("/state/:domain", get(read_domain).put(set_domain))
        .route("/events", get(subscribe_events))
        .route("/stats", get(stats))
        .with_state(ctx)
}

// ==================
// Handlers
// ==================

/// Conditional read of a domain payload.
async fn read_domain(
    State(ctx): State<Arc<SyncContext>>,
    Path(domain): Path<String>,
    headers: HeaderMap,
) -> Response {
    let presented = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    match ctx.read_domain(&domain, presented) {
        DomainRead::Absent => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown domain: {}", domain),
            }),
        )
            .into_response(),
        DomainRead::NotModified { version } => (
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, render_token(version))],
        )
            .into_response(),
        DomainRead::Fresh { payload, version } => (
            StatusCode::OK,
            [(header::ETAG, render_token(version))],
            Json(payload),
        )
            .into_response(),
    }
}

/// Commit a mutation: store, flush schedule, version bump, cache
/// invalidation and client notification are the explicit side effects.
async fn set_domain(
    State(ctx): State<Arc<SyncContext>>,
    Path(domain): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    match ctx.commit_mutation(&domain, payload) {
        Ok(version) => (StatusCode::OK, Json(MutationResponse { domain, version })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Admit a push connection and stream frames until the client disconnects.
async fn subscribe_events(State(ctx): State<Arc<SyncContext>>) -> Response {
    let (tx, rx) = push_channel();

    match ctx.hub().add_client(tx, &ctx.versions().all()) {
        Ok(id) => {
            let stream = ClientStream {
                rx,
                hub: Arc::clone(ctx.hub()),
                id,
            };
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/event-stream"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(HubError::AtCapacity(capacity)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: format!("Too many live connections (max {})", capacity),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Observability snapshot.
async fn stats(State(ctx): State<Arc<SyncContext>>) -> Json<StatsResponse> {
    let cache = ctx.cache().stats();
    Json(StatsResponse {
        hub: ctx.hub().stats(),
        cache: CacheStatsResponse {
            valid_count: cache.valid_count,
            expired_count: cache.expired_count,
            total_count: cache.total_count,
            keys: cache.keys,
        },
        versions: ctx.versions().all(),
        flushes: ctx.coordinator().flush_count(),
    })
}

/// Frame stream for one admitted connection. Dropping it (client went away)
/// removes the connection from the hub's live set.
struct ClientStream {
    rx: PushReceiver,
    hub: Arc<NotificationHub>,
    id: Uuid,
}

impl Stream for ClientStream {
    type Item = Result<String, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        self.hub.remove_client(self.id);
    }
}
