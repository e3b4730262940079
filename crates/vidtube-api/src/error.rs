use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use vidtube_db::StoreError;
use vidtube_types::api::ApiResponse;

/// Request failures, one variant per status class the API answers with.
/// Every variant is raised before any write, except `Dependency`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Dependency(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(format!("{} not found", capitalize(entity))),
            StoreError::NotOwner => {
                Self::Forbidden("Only the owner can modify this resource".into())
            }
            StoreError::AlreadyPresent => {
                Self::Conflict("Video already exists in playlist".into())
            }
            StoreError::NotPresent => Self::Conflict("Video is not in playlist".into()),
            StoreError::Duplicate(what) => Self::Conflict(format!("{} already taken", capitalize(what))),
            StoreError::ToggleConflict => {
                Self::Conflict("Relation changed concurrently, retry".into())
            }
            StoreError::InvalidTarget(kind) => {
                Self::NotFound(format!("{} not found", capitalize(kind.as_str())))
            }
            StoreError::InvalidSubject => Self::Unauthenticated,
            StoreError::InvalidChannel => Self::NotFound("Channel not found".into()),
            e @ (StoreError::Sqlite(_) | StoreError::Lock(_)) => {
                error!("Store failure: {}", e);
                Self::Dependency("Internal store error".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::new(status.as_u16(), serde_json::Value::Null, self.to_string());
        (status, Json(body)).into_response()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidtube_types::models::TargetKind;

    #[test]
    fn test_store_error_mapping() {
        let cases = [
            (StoreError::NotFound("playlist"), StatusCode::NOT_FOUND),
            (StoreError::NotOwner, StatusCode::FORBIDDEN),
            (StoreError::AlreadyPresent, StatusCode::BAD_REQUEST),
            (StoreError::NotPresent, StatusCode::BAD_REQUEST),
            (StoreError::InvalidTarget(TargetKind::Video), StatusCode::NOT_FOUND),
            (StoreError::InvalidSubject, StatusCode::UNAUTHORIZED),
            (StoreError::InvalidChannel, StatusCode::NOT_FOUND),
            (StoreError::Lock("poisoned".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::from(StoreError::NotFound("playlist"));
        assert_eq!(err.to_string(), "Playlist not found");
    }
}
