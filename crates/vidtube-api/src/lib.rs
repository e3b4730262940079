pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod healthcheck;
pub mod likes;
pub mod media;
pub mod middleware;
pub mod playlists;
pub mod routes;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod validate;
pub mod videos;

#[cfg(test)]
mod tests;

use axum::{Json, http::StatusCode};
use serde::Serialize;
use tracing::error;

use vidtube_db::{Database, StoreError};
use vidtube_types::api::ApiResponse;

use crate::auth::AppState;
use crate::error::ApiError;

/// Run a store operation off the async runtime and map its error.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Dependency("background task failed".into())
        })?
        .map_err(ApiError::from)
}

pub(crate) fn reply<T: Serialize>(
    status: StatusCode,
    data: T,
    message: &str,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (status, Json(ApiResponse::new(status.as_u16(), data, message)))
}

pub(crate) fn ok<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    reply(StatusCode::OK, data, message)
}

pub(crate) fn created<T: Serialize>(
    data: T,
    message: &str,
) -> (StatusCode, Json<ApiResponse<T>>) {
    reply(StatusCode::CREATED, data, message)
}
