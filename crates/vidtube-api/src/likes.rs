use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};

use vidtube_types::api::Claims;
use vidtube_types::models::{TargetKind, ToggleOutcome, ToggleState};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validate::parse_id;
use crate::{ok, run_blocking};

/// Flip a relation for the caller. Shared by like and subscription routes.
pub(crate) async fn toggle(
    state: &AppState,
    claims: &Claims,
    raw_target: &str,
    kind: TargetKind,
) -> Result<ToggleOutcome, ApiError> {
    let target_id = parse_id(kind.as_str(), raw_target)?;
    let subject_id = claims.sub;
    run_blocking(state, move |db| db.toggle_relation(subject_id, target_id, kind)).await
}

async fn toggle_like(
    state: AppState,
    claims: Claims,
    raw_target: String,
    kind: TargetKind,
    label: &'static str,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = toggle(&state, &claims, &raw_target, kind).await?;
    let message = match outcome.state {
        ToggleState::Active => format!("{} liked successfully", label),
        ToggleState::Inactive => format!("{} unliked successfully", label),
    };
    Ok(ok(outcome, &message))
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    toggle_like(state, claims, video_id, TargetKind::Video, "Video").await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    toggle_like(state, claims, comment_id, TargetKind::Comment, "Comment").await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    toggle_like(state, claims, tweet_id, TargetKind::Tweet, "Tweet").await
}

/// Everything the caller has liked, grouped by kind.
pub async fn like_breakdown(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let breakdown = run_blocking(&state, move |db| db.like_breakdown(claims.sub)).await?;
    Ok(ok(breakdown, "Liked items fetched successfully"))
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let breakdown = run_blocking(&state, move |db| db.like_breakdown(claims.sub)).await?;
    Ok(ok(breakdown.video_likes, "Liked videos fetched successfully"))
}
