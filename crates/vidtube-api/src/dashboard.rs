use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validate::parse_id;
use crate::{ok, run_blocking};

pub async fn channel_stats(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_id("channel", &channel_id)?;
    let stats = run_blocking(&state, move |db| db.channel_stats(channel_id)).await?;
    Ok(ok(stats, "Channel stats fetched successfully"))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_id("channel", &channel_id)?;
    let videos = run_blocking(&state, move |db| db.channel_videos(channel_id)).await?;
    Ok(ok(videos, "Channel videos fetched successfully"))
}
