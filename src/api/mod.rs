pub mod dto;
pub mod errors;
pub mod handlers;
pub mod stream;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::status_store::StatusStore;
use handlers::ApiDoc;

/// Shared by every handler: the status store and the process-wide shutdown
/// signal that open stream connections watch.
#[derive(Clone)]
pub struct AppState {
    pub store: StatusStore,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: StatusStore) -> Self {
        Self::with_shutdown(store, CancellationToken::new())
    }

    pub fn with_shutdown(store: StatusStore, shutdown: CancellationToken) -> Self {
        Self { store, shutdown }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/measure/v1/ws", get(stream::stream_ingest))
        .route("/measure/v1/report", get(handlers::report))
        .route("/measure/v1/collect", get(handlers::collect))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
