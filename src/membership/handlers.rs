//! HTTP coordination server.
//!
//! Exposes an `EntryStore` over HTTP so monitor processes on different hosts can register
//! with, and discover, each other.

use super::protocol::*;
use super::store::EntryStore;

use crate::membership::coordination::CoordinationError;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub async fn handle_create_entry(
    Extension(store): Extension<Arc<EntryStore>>,
    Json(req): Json<CreateEntryRequest>,
) -> StatusCode {
    match store.create(&req.session, &req.path, &req.payload) {
        Ok(()) => {
            tracing::info!("Registered {} -> {}", req.path, req.payload);
            StatusCode::CREATED
        }
        Err(CoordinationError::NodeExists(path)) => {
            tracing::debug!("Entry {} already exists", path);
            StatusCode::CONFLICT
        }
        Err(e) => {
            tracing::error!("Failed to create entry {}: {}", req.path, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn handle_entry_exists(
    Extension(store): Extension<Arc<EntryStore>>,
    Query(query): Query<PathQuery>,
) -> Json<ExistsResponse> {
    Json(ExistsResponse {
        exists: store.exists(&query.path),
    })
}

pub async fn handle_entry_owner(
    Extension(store): Extension<Arc<EntryStore>>,
    Query(query): Query<PathQuery>,
) -> Json<OwnerResponse> {
    Json(OwnerResponse {
        session: store.get(&query.path).map(|entry| entry.session),
    })
}

pub async fn handle_list_children(
    Extension(store): Extension<Arc<EntryStore>>,
    Query(query): Query<PathQuery>,
) -> Json<ChildrenResponse> {
    Json(ChildrenResponse {
        children: store.children(&query.path),
    })
}

pub async fn handle_delete_entry(
    Extension(store): Extension<Arc<EntryStore>>,
    Query(query): Query<PathQuery>,
) -> StatusCode {
    match store.delete(&query.path) {
        Ok(()) => {
            tracing::info!("Unregistered {}", query.path);
            StatusCode::OK
        }
        Err(_) => StatusCode::NOT_FOUND,
    }
}

pub async fn handle_keepalive(
    Extension(store): Extension<Arc<EntryStore>>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    store.touch(&req.session);
    StatusCode::OK
}

pub async fn handle_close_session(
    Extension(store): Extension<Arc<EntryStore>>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    store.close_session(&req.session);
    StatusCode::OK
}

pub fn router(store: Arc<EntryStore>) -> Router {
    Router::new()
        .route(
            ENDPOINT_ENTRIES,
            post(handle_create_entry).delete(handle_delete_entry),
        )
        .route(ENDPOINT_ENTRY_EXISTS, get(handle_entry_exists))
        .route(ENDPOINT_ENTRY_CHILDREN, get(handle_list_children))
        .route(ENDPOINT_ENTRY_OWNER, get(handle_entry_owner))
        .route(ENDPOINT_SESSION_KEEPALIVE, post(handle_keepalive))
        .route(ENDPOINT_SESSION_CLOSE, post(handle_close_session))
        .layer(Extension(store))
}

/// Serves the coordination API on `listener` until the process exits.
pub async fn serve(listener: TcpListener, store: Arc<EntryStore>) -> Result<()> {
    let reap_every = (store.session_ttl() / 2).max(Duration::from_millis(100));
    let reaper = store.clone().start_reaper(reap_every);

    tracing::info!(
        "Coordination service listening on {} (session ttl {:?})",
        listener.local_addr()?,
        store.session_ttl()
    );

    let served = axum::serve(listener, router(store)).await;
    reaper.abort();
    served?;

    Ok(())
}
