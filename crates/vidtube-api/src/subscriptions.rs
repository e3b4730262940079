use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};

use vidtube_types::api::Claims;
use vidtube_types::models::{TargetKind, ToggleState};
use vidtube_types::query::SubscriptionListQuery;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::QueryParams;
use crate::likes::toggle;
use crate::validate::parse_id;
use crate::{ok, run_blocking};

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = toggle(&state, &claims, &channel_id, TargetKind::Channel).await?;
    let message = match outcome.state {
        ToggleState::Active => "Subscribed successfully",
        ToggleState::Inactive => "Unsubscribed successfully",
    };
    Ok(ok(outcome, message))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    QueryParams(query): QueryParams<SubscriptionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_id("channel", &channel_id)?;
    let subscribers =
        run_blocking(&state, move |db| db.subscriber_list(channel_id, query.order)).await?;
    Ok(ok(subscribers, "Channel subscribers fetched successfully"))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
    QueryParams(query): QueryParams<SubscriptionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber_id = parse_id("subscriber", &subscriber_id)?;
    let channels =
        run_blocking(&state, move |db| db.subscribed_channels(subscriber_id, query.order)).await?;
    Ok(ok(channels, "Subscribed channels fetched successfully"))
}
