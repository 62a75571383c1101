//! Batch handlers. Each request runs exactly one batch.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::error;

use fanout_core::BatchError;

use crate::coordinator::{Coordinator, WorkItem};
use crate::fetch::fetch_work_items;
use crate::http::responses::{ErrorResponse, RequestsResponse, TasksResponse};
use crate::state::{AppState, ASYNC_HTTP_BATCH, ASYNC_TASKS_BATCH, SYNC_HTTP_BATCH};

/// Run the simulated tasks concurrently.
pub async fn async_tasks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let items: Vec<WorkItem<()>> = state
        .config
        .simulated_tasks
        .iter()
        .map(|task| {
            let delay = task.delay;
            WorkItem::new(task.name.clone(), move || async move {
                tokio::time::sleep(delay).await;
                Ok::<_, std::convert::Infallible>(())
            })
        })
        .collect();

    match Coordinator::new(ASYNC_TASKS_BATCH).run_batch(items).await {
        Ok(summary) => Json(TasksResponse::from(&summary)).into_response(),
        Err(e) => batch_error(e),
    }
}

/// Fetch every configured URL concurrently.
pub async fn async_http(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let items = fetch_work_items(&state.fetcher, &state.config.urls);

    match Coordinator::new(ASYNC_HTTP_BATCH).run_batch(items).await {
        Ok(summary) => Json(RequestsResponse::from(&summary)).into_response(),
        Err(e) => batch_error(e),
    }
}

/// Fetch every configured URL one after another.
pub async fn sync_http(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let items = fetch_work_items(&state.fetcher, &state.config.urls);

    match Coordinator::new(SYNC_HTTP_BATCH)
        .run_batch_sequential(items)
        .await
    {
        Ok(summary) => Json(RequestsResponse::from(&summary)).into_response(),
        Err(e) => batch_error(e),
    }
}

/// A batch that could not start is a configuration bug, not a client error.
fn batch_error(e: BatchError) -> Response {
    error!(error = %e, "Batch rejected");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
