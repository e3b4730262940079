use axum::response::IntoResponse;

use crate::ok;

pub async fn healthcheck() -> impl IntoResponse {
    ok(serde_json::json!({}), "Service is healthy")
}
