use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};

use vidtube_types::api::{Claims, ContentRequest, DeleteConfirmation};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::validate::{parse_id, required};
use crate::{created, ok, run_blocking};

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required("content", &req.content)?;
    let tweet = run_blocking(&state, move |db| db.create_tweet(claims.sub, &content)).await?;
    Ok(created(tweet, "Tweet created successfully"))
}

pub async fn user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id("user", &user_id)?;
    let tweets = run_blocking(&state, move |db| db.user_tweets(user_id)).await?;
    Ok(ok(tweets, "Tweets fetched successfully"))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_id("tweet", &tweet_id)?;
    let content = required("content", &req.content)?;
    let tweet = run_blocking(&state, move |db| {
        db.update_tweet(tweet_id, claims.sub, Some(&content))
    })
    .await?;
    Ok(ok(tweet, "Tweet updated successfully"))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id("tweet", &tweet_id)?;
    run_blocking(&state, move |db| db.delete_tweet(id, claims.sub)).await?;
    Ok(ok(DeleteConfirmation { id, deleted: true }, "Tweet deleted successfully"))
}
